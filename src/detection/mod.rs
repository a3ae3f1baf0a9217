pub mod aggregator;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 0.2 => ConfidenceLevel::None,
            s if s < 0.4 => ConfidenceLevel::Low,
            s if s < 0.6 => ConfidenceLevel::Medium,
            s if s < 0.8 => ConfidenceLevel::High,
            _ => ConfidenceLevel::VeryHigh
        }
    }
    
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::None => "no synthetic evidence",
            ConfidenceLevel::Low => "weak synthetic evidence",
            ConfidenceLevel::Medium => "inconclusive",
            ConfidenceLevel::High => "likely synthetic",
            ConfidenceLevel::VeryHigh => "strong synthetic evidence"
        }
    }
}

/// Clip into [0, 1]. NaN maps to 0 so it can never reach the aggregate.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Anything carrying a [0, 1] evidence score.
pub trait Scored {
    fn score(&self) -> f64;
}

/// One independent forensic heuristic over a decoded image.
///
/// Implementations are pure: they only read the image and allocate their own
/// working buffers, so several may run concurrently over the same `&RgbImage`.
pub trait ScoreAnalyzer: Sync {
    type Output: Scored + Send;
    
    fn analyze(&self, image: &RgbImage) -> Result<Self::Output>;
    
    fn name(&self) -> &str;
    
    fn description(&self) -> &str;
}
