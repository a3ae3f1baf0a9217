use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    ForensicReport,
    detection::clamp_score,
    error::{ForensicsError, Result},
};

pub const FREQUENCY_WEIGHT: f64 = 0.35;
pub const NOISE_WEIGHT: f64 = 0.30;
pub const COMPRESSION_WEIGHT: f64 = 0.20;
pub const COLOR_WEIGHT: f64 = 0.15;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Relative trust in each signal. Fixed design constants, not fitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatorWeights {
    pub frequency: f64,
    pub noise: f64,
    pub compression: f64,
    pub color_corr: f64,
}

impl Default for AggregatorWeights {
    fn default() -> Self {
        Self {
            frequency: FREQUENCY_WEIGHT,
            noise: NOISE_WEIGHT,
            compression: COMPRESSION_WEIGHT,
            color_corr: COLOR_WEIGHT,
        }
    }
}

impl AggregatorWeights {
    fn validate(&self) -> Result<()> {
        let all = [self.frequency, self.noise, self.compression, self.color_corr];

        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ForensicsError::InvalidParameter(
                "Aggregator weights must be finite and non-negative".into(),
            ));
        }

        let sum = all.iter().sum::<f64>();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ForensicsError::InvalidParameter(format!(
                "Aggregator weights must sum to 1.0 (got {sum})"
            )));
        }

        Ok(())
    }
}

/// Fuses the four sub-scores into one forensic score.
#[derive(Debug, Clone, Default)]
pub struct ForensicAggregator {
    weights: AggregatorWeights,
}

impl ForensicAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: AggregatorWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &AggregatorWeights {
        &self.weights
    }

    pub fn combine(
        &self,
        frequency: f64,
        noise: f64,
        compression: f64,
        color_corr: f64,
    ) -> ForensicReport {
        let frequency = clamp_score(frequency);
        let noise = clamp_score(noise);
        let compression = clamp_score(compression);
        let color_corr = clamp_score(color_corr);

        let w = &self.weights;
        let forensic_score = clamp_score(
            w.frequency * frequency
                + w.noise * noise
                + w.compression * compression
                + w.color_corr * color_corr,
        );

        info!(
            "forensic score {forensic_score:.4} (frequency {frequency:.4}, noise {noise:.4}, \
             compression {compression:.4}, color {color_corr:.4})"
        );

        ForensicReport {
            forensic_score,
            frequency,
            noise,
            compression,
            color_corr,
        }
    }
}
