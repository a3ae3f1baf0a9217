use std::io::Cursor;

use image::{GrayImage, RgbImage};
use log::{debug, warn};
use ndarray::Array2;
use statrs::statistics::Statistics;

use crate::{
    CompressionResult,
    detection::{ScoreAnalyzer, clamp_score},
    error::Result,
    image_utils::{array_to_gray, block_variance, extract_block, gray_to_array, rgb_to_gray},
};

pub const RECOMPRESSION_QUALITY: u8 = 85;
pub const BLOCK_SIZE: usize = 8;
pub const SPREAD_GAIN: f64 = 50.0;
/// Returned when the image holds no complete block or cannot be JPEG-encoded.
pub const NEUTRAL_SCORE: f64 = 0.5;
/// Largest width or height a baseline JPEG frame header can carry.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Scores how unevenly JPEG re-compression error is spread across 8x8 blocks.
pub struct CompressionAnalyzer {
    quality: u8,
    block_size: usize,
}

impl CompressionAnalyzer {
    pub fn new() -> Self {
        Self {
            quality: RECOMPRESSION_QUALITY,
            block_size: BLOCK_SIZE,
        }
    }

    fn recompress_jpeg(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut buffer = Cursor::new(Vec::new());

        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.quality);
        image.write_with_encoder(encoder)?;

        let recompressed = image::load_from_memory(&buffer.into_inner())?;

        Ok(recompressed.to_rgb8())
    }

    /// Absolute grayscale difference against the re-encoded copy, in [0, 1].
    pub fn error_map(&self, image: &RgbImage) -> Result<Array2<f64>> {
        let original = gray_to_array(&rgb_to_gray(image));
        let recompressed = gray_to_array(&rgb_to_gray(&self.recompress_jpeg(image)?));

        Ok((original - recompressed).mapv(|d| d.abs() / 255.0))
    }

    fn neutral(&self, error_map: GrayImage) -> CompressionResult {
        CompressionResult {
            score: NEUTRAL_SCORE,
            block_count: 0,
            block_variance_spread: 0.0,
            error_map,
        }
    }

    /// Variance of each complete, non-overlapping block; partial edge blocks are skipped.
    pub fn block_variances(&self, error: &Array2<f64>) -> Vec<f64> {
        let (height, width) = error.dim();
        let size = self.block_size;
        let mut variances = Vec::with_capacity((height / size) * (width / size));

        for by in 0..height / size {
            for bx in 0..width / size {
                let block = extract_block(error, bx * size, by * size, size);
                variances.push(block_variance(&block));
            }
        }

        variances
    }
}

impl Default for CompressionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAnalyzer for CompressionAnalyzer {
    type Output = CompressionResult;

    fn analyze(&self, image: &RgbImage) -> Result<CompressionResult> {
        let (width, height) = image.dimensions();
        if width > MAX_JPEG_DIMENSION || height > MAX_JPEG_DIMENSION {
            warn!(
                "image {width}x{height} exceeds the JPEG limit of {MAX_JPEG_DIMENSION}, \
                 using neutral compression score"
            );
            return Ok(self.neutral(GrayImage::new(width, height)));
        }

        let error = self.error_map(image)?;
        let variances = self.block_variances(&error);
        let error_map = array_to_gray(&(&error * 255.0).mapv(f64::round));

        if variances.is_empty() {
            warn!(
                "image {width}x{height} holds no complete {0}x{0} block, \
                 using neutral compression score",
                self.block_size
            );
            return Ok(self.neutral(error_map));
        }

        let spread = variances.iter().population_std_dev();
        let score = clamp_score((spread * SPREAD_GAIN).tanh());

        debug!(
            "compression blocks={} spread={:.6}",
            variances.len(),
            spread
        );

        Ok(CompressionResult {
            score,
            block_count: variances.len(),
            block_variance_spread: spread,
            error_map,
        })
    }

    fn name(&self) -> &str {
        "compression"
    }

    fn description(&self) -> &str {
        "Spread of JPEG re-compression error variance across 8x8 blocks"
    }
}
