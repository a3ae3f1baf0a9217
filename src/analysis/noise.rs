use image::{GrayImage, Luma, RgbImage};
use log::debug;
use ndarray::{Array1, Array2};
use ndarray_stats::EntropyExt;

use crate::{
    NoiseResult,
    detection::{ScoreAnalyzer, clamp_score},
    error::{ForensicsError, Result},
    image_utils::{gray_to_array, laplacian, median_3x3, rgb_to_gray},
};

pub const RESIDUAL_WEIGHT: f64 = 0.45;
pub const LAPLACIAN_WEIGHT: f64 = 0.35;
pub const ENTROPY_WEIGHT: f64 = 0.20;

pub const RESIDUAL_GAIN: f64 = 10.0;
pub const LAPLACIAN_GAIN: f64 = 5.0;
pub const ENTROPY_SCALE: f64 = 3.0;

pub const HISTOGRAM_BINS: usize = 64;
pub const HISTOGRAM_RANGE: (f64, f64) = (-0.2, 0.2);

const BIN_FLOOR: f64 = 1e-12;

/// Raw statistics of the noise residual, before saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseStatistics {
    pub residual_std: f64,
    pub laplacian_std: f64,
    pub residual_entropy: f64,
}

impl NoiseStatistics {
    pub fn score(&self) -> f64 {
        clamp_score(
            RESIDUAL_WEIGHT * (self.residual_std * RESIDUAL_GAIN).tanh()
                + LAPLACIAN_WEIGHT * (self.laplacian_std * LAPLACIAN_GAIN).tanh()
                + ENTROPY_WEIGHT * (self.residual_entropy / ENTROPY_SCALE).tanh(),
        )
    }
}

/// Scores the texture of what a 3x3 median filter removes from the image.
pub struct NoiseAnalyzer {
    bins: usize,
    range: (f64, f64),
}

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self {
            bins: HISTOGRAM_BINS,
            range: HISTOGRAM_RANGE,
        }
    }

    /// Grayscale minus its median-filtered baseline, both in [0, 1].
    pub fn extract_residual(&self, gray: &GrayImage) -> Array2<f64> {
        let baseline = gray_to_array(&median_3x3(gray));
        (gray_to_array(gray) - baseline) / 255.0
    }

    /// Shannon entropy (nats) of the residual histogram over the fixed range.
    /// Values outside the range are not counted.
    pub fn residual_entropy(&self, residual: &Array2<f64>) -> Result<f64> {
        let (lo, hi) = self.range;
        let mut counts = vec![0usize; self.bins];

        for &value in residual.iter() {
            if value < lo || value > hi {
                continue;
            }
            let idx = ((value - lo) / (hi - lo) * self.bins as f64) as usize;
            counts[idx.min(self.bins - 1)] += 1;
        }

        let total = counts.iter().sum::<usize>();
        let probabilities = counts
            .iter()
            .map(|&c| {
                let p = if total > 0 { c as f64 / total as f64 } else { 0.0 };
                p + BIN_FLOOR
            })
            .collect::<Array1<f64>>();

        probabilities
            .entropy()
            .map_err(|e| ForensicsError::AnalysisFailed(format!("residual entropy: {e}")))
    }

    pub fn statistics(&self, gray: &GrayImage, residual: &Array2<f64>) -> Result<NoiseStatistics> {
        let edges = laplacian(&gray_to_array(gray)).mapv(f64::abs);

        Ok(NoiseStatistics {
            residual_std: residual.std(0.0),
            laplacian_std: edges.std(0.0) / 255.0,
            residual_entropy: self.residual_entropy(residual)?,
        })
    }

    fn render_residual(residual: &Array2<f64>) -> GrayImage {
        let (height, width) = residual.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            let v = 128.0 + residual[[y as usize, x as usize]] * 255.0;
            Luma([v.round().clamp(0.0, 255.0) as u8])
        })
    }
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAnalyzer for NoiseAnalyzer {
    type Output = NoiseResult;

    fn analyze(&self, image: &RgbImage) -> Result<NoiseResult> {
        let gray = rgb_to_gray(image);
        let residual = self.extract_residual(&gray);
        let stats = self.statistics(&gray, &residual)?;

        debug!(
            "noise residual_std={:.5} laplacian_std={:.5} entropy={:.4}",
            stats.residual_std, stats.laplacian_std, stats.residual_entropy
        );

        Ok(NoiseResult {
            score: stats.score(),
            residual_std: stats.residual_std,
            laplacian_std: stats.laplacian_std,
            residual_entropy: stats.residual_entropy,
            residual_map: Self::render_residual(&residual),
        })
    }

    fn name(&self) -> &str {
        "noise"
    }

    fn description(&self) -> &str {
        "Median-filter residual spread, edge energy and residual entropy"
    }
}
