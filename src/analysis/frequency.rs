use image::RgbImage;
use log::debug;
use ndarray::{Array2, ArrayView1};
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::{
    FrequencyResult,
    detection::{ScoreAnalyzer, clamp_score},
    error::Result,
    image_utils::{array_to_gray, gray_to_array, normalize_to_u8, resize_area, rgb_to_gray},
};

/// Side of the square canvas every input is resampled to before the FFT.
pub const CANVAS_SIZE: usize = 256;
/// Outer edge of the low band, as a fraction of the largest radius.
pub const LOW_BAND_RADIUS: f64 = 0.25;
/// Outer edge of the mid band; everything beyond is high band.
pub const MID_BAND_RADIUS: f64 = 0.6;
pub const HIGH_ENERGY_WEIGHT: f64 = 0.7;
pub const BALANCE_WEIGHT: f64 = 0.3;

const EPSILON: f64 = 1e-8;

/// Share of log-magnitude spectral energy per radial band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergies {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl BandEnergies {
    /// Mid+high energy relative to low energy. Unbounded.
    pub fn balance(&self) -> f64 {
        (self.mid + self.high) / (self.low + EPSILON)
    }

    /// High-band share blended with a saturating transform of the balance.
    pub fn score(&self) -> f64 {
        let balance = self.balance();
        clamp_score(HIGH_ENERGY_WEIGHT * self.high + BALANCE_WEIGHT * (balance / (balance + 1.0)))
    }
}

/// Scores how spectral energy is spread between low, mid and high frequencies.
pub struct FrequencyAnalyzer {
    canvas_size: usize,
}

impl FrequencyAnalyzer {
    pub fn new() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
        }
    }

    /// Centered log(1 + |F|) spectrum of the resampled grayscale image.
    pub fn log_magnitude_spectrum(&self, image: &RgbImage) -> Array2<f64> {
        let gray = gray_to_array(&rgb_to_gray(image));
        let canvas = resize_area(&gray, self.canvas_size, self.canvas_size);

        let spectrum = fft_shift(&fft2(&canvas));
        spectrum.mapv(|c| c.norm().ln_1p())
    }

    pub fn band_energies(&self, log_magnitude: &Array2<f64>) -> BandEnergies {
        let (height, width) = log_magnitude.dim();
        let cy = (height / 2) as f64;
        let cx = (width / 2) as f64;

        let radius = |y: usize, x: usize| ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();

        let max_r = (0..height)
            .flat_map(|y| (0..width).map(move |x| (y, x)))
            .map(|(y, x)| radius(y, x))
            .fold(0.0f64, f64::max);

        let low_edge = LOW_BAND_RADIUS * max_r;
        let mid_edge = MID_BAND_RADIUS * max_r;

        let mut low = 0.0;
        let mut mid = 0.0;
        let mut high = 0.0;

        for ((y, x), &value) in log_magnitude.indexed_iter() {
            let r = radius(y, x);
            if r <= low_edge {
                low += value;
            } else if r <= mid_edge {
                mid += value;
            } else {
                high += value;
            }
        }

        let total = low + mid + high + EPSILON;

        BandEnergies {
            low: low / total,
            mid: mid / total,
            high: high / total,
        }
    }
}

impl Default for FrequencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAnalyzer for FrequencyAnalyzer {
    type Output = FrequencyResult;

    fn analyze(&self, image: &RgbImage) -> Result<FrequencyResult> {
        let log_magnitude = self.log_magnitude_spectrum(image);
        let energies = self.band_energies(&log_magnitude);
        let score = energies.score();

        debug!(
            "frequency bands low={:.4} mid={:.4} high={:.4} balance={:.4}",
            energies.low,
            energies.mid,
            energies.high,
            energies.balance()
        );

        Ok(FrequencyResult {
            score,
            low_energy: energies.low,
            mid_energy: energies.mid,
            high_energy: energies.high,
            balance: energies.balance(),
            spectrum: array_to_gray(&normalize_to_u8(&log_magnitude)),
        })
    }

    fn name(&self) -> &str {
        "frequency"
    }

    fn description(&self) -> &str {
        "Radial distribution of log-magnitude spectral energy"
    }
}

/// Separable 2-D DFT: rows, then columns.
fn fft2(input: &Array2<f64>) -> Array2<Complex<f64>> {
    let (rows, cols) = input.dim();
    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_forward(cols);
    let col_fft = planner.plan_fft_forward(rows);

    let mut data = input.mapv(|v| Complex::new(v, 0.0));

    for mut row in data.rows_mut() {
        let mut buffer = row.to_vec();
        row_fft.process(&mut buffer);
        row.assign(&ArrayView1::from(buffer.as_slice()));
    }

    for mut column in data.columns_mut() {
        let mut buffer = column.to_vec();
        col_fft.process(&mut buffer);
        column.assign(&ArrayView1::from(buffer.as_slice()));
    }

    data
}

/// Moves the zero-frequency bin to `(rows / 2, cols / 2)`.
fn fft_shift<T: Clone>(input: &Array2<T>) -> Array2<T> {
    let (rows, cols) = input.dim();
    Array2::from_shape_fn((rows, cols), |(y, x)| {
        input[[(y + rows - rows / 2) % rows, (x + cols - cols / 2) % cols]].clone()
    })
}
