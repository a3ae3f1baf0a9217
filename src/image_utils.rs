use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;
use statrs::statistics::Statistics;

/// ITU-R BT.601 luma, rounded to the nearest intensity.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum =
            0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([lum.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

pub fn array_to_gray(arr: &Array2<f64>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut image = GrayImage::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            let value = arr[[y, x]].clamp(0.0, 255.0) as u8;
            image.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }

    image
}

pub fn normalize_to_u8(arr: &Array2<f64>) -> Array2<f64> {
    let min = arr.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = arr.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range < 1e-10 {
        Array2::zeros(arr.dim())
    } else {
        arr.mapv(|v| ((v - min) / range) * 255.0)
    }
}

/// For every destination index, the source indices it covers and the overlap of each.
fn area_spans(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = start + scale;
            let mut span = Vec::new();
            let mut s = start.floor() as usize;

            while (s as f64) < end && s < src_len {
                let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                if overlap > 0.0 {
                    span.push((s, overlap));
                }
                s += 1;
            }

            span
        })
        .collect()
}

/// Area-averaging resample: each output cell is the overlap-weighted mean of the
/// source cells it covers.
pub fn resize_area(src: &Array2<f64>, out_height: usize, out_width: usize) -> Array2<f64> {
    let (height, width) = src.dim();
    let rows = area_spans(height, out_height);
    let cols = area_spans(width, out_width);
    let mut out = Array2::zeros((out_height, out_width));

    for (oy, row_span) in rows.iter().enumerate() {
        for (ox, col_span) in cols.iter().enumerate() {
            let mut sum = 0.0;
            let mut area = 0.0;

            for &(sy, wy) in row_span {
                for &(sx, wx) in col_span {
                    let w = wy * wx;
                    sum += src[[sy, sx]] * w;
                    area += w;
                }
            }

            out[[oy, ox]] = if area > 0.0 { sum / area } else { 0.0 };
        }
    }

    out
}

pub fn median_3x3(image: &GrayImage) -> GrayImage {
    imageproc::filter::median_filter(image, 1, 1)
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge sample.
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

pub fn convolve_3x3(arr: &Array2<f64>, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
    let (height, width) = arr.dim();
    let mut result = Array2::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;

            for (ky, kernel_row) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + ky as isize - 1, height);
                for (kx, &k) in kernel_row.iter().enumerate() {
                    let sx = reflect_101(x as isize + kx as isize - 1, width);
                    sum += arr[[sy, sx]] * k;
                }
            }

            result[[y, x]] = sum;
        }
    }

    result
}

pub fn laplacian(arr: &Array2<f64>) -> Array2<f64> {
    let kernel = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

    convolve_3x3(arr, &kernel)
}

pub fn extract_block(arr: &Array2<f64>, x: usize, y: usize, size: usize) -> Vec<f64> {
    let (height, width) = arr.dim();
    let mut block = Vec::with_capacity(size * size);

    for dy in 0..size {
        for dx in 0..size {
            if x + dx < width && y + dy < height {
                block.push(arr[[y + dy, x + dx]]);
            }
        }
    }

    block
}

pub fn block_variance(block: &[f64]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().population_variance()
}
