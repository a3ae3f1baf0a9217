use image::RgbImage;
use log::debug;
use ndarray::{Array2, ArrayView1, Axis};
use ndarray_stats::CorrelationExt;

use crate::{
    ColorCorrelationResult,
    detection::{ScoreAnalyzer, clamp_score},
    error::{ForensicsError, Result},
};

/// Channels with a standard deviation below this are treated as flat.
pub const MIN_CHANNEL_STD: f64 = 1e-6;

/// Scores the mean pairwise Pearson correlation between R, G and B.
pub struct ColorCorrelationAnalyzer;

impl ColorCorrelationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// One row per channel (R, G, B), one column per pixel.
    fn split_channels(image: &RgbImage) -> Array2<f64> {
        let pixel_count = (image.width() * image.height()) as usize;
        let mut channels = Array2::zeros((3, pixel_count));

        for (i, pixel) in image.pixels().enumerate() {
            for c in 0..3 {
                channels[[c, i]] = pixel[c] as f64;
            }
        }

        channels
    }

    fn is_flat(channel: ArrayView1<f64>) -> bool {
        channel.std(0.0) < MIN_CHANNEL_STD
    }

    /// `(rg, rb, gb)` correlations, with 0 for any pair touching a flat channel.
    pub fn pairwise_correlations(&self, image: &RgbImage) -> Result<(f64, f64, f64)> {
        let channels = Self::split_channels(image);
        let flat = [
            Self::is_flat(channels.row(0)),
            Self::is_flat(channels.row(1)),
            Self::is_flat(channels.row(2)),
        ];

        if flat.iter().all(|&f| f) {
            return Ok((0.0, 0.0, 0.0));
        }

        let pair = |a: usize, b: usize| -> Result<f64> {
            if flat[a] || flat[b] {
                return Ok(0.0);
            }
            let corr = channels
                .select(Axis(0), &[a, b])
                .pearson_correlation()
                .map_err(|e| ForensicsError::AnalysisFailed(format!("channel correlation: {e}")))?;
            Ok(corr[[0, 1]])
        };

        Ok((pair(0, 1)?, pair(0, 2)?, pair(1, 2)?))
    }
}

impl Default for ColorCorrelationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAnalyzer for ColorCorrelationAnalyzer {
    type Output = ColorCorrelationResult;

    fn analyze(&self, image: &RgbImage) -> Result<ColorCorrelationResult> {
        let (rg, rb, gb) = self.pairwise_correlations(image)?;
        let average = (rg + rb + gb) / 3.0;
        let score = clamp_score((average + 1.0) / 2.0);

        debug!("color correlation rg={rg:.4} rb={rb:.4} gb={gb:.4}");

        Ok(ColorCorrelationResult { score, rg, rb, gb })
    }

    fn name(&self) -> &str {
        "color_correlation"
    }

    fn description(&self) -> &str {
        "Mean pairwise Pearson correlation of the color channels"
    }
}
