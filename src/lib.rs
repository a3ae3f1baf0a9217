use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        color_correlation::ColorCorrelationAnalyzer, compression::CompressionAnalyzer,
        frequency::FrequencyAnalyzer, noise::NoiseAnalyzer,
    },
    detection::{ConfidenceLevel, ScoreAnalyzer, Scored, aggregator::ForensicAggregator},
    error::{ForensicsError, Result},
};

pub mod error;
pub mod image_utils;
pub mod analysis;
pub mod detection;
pub mod report;

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub parallel: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ScoringConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Decode an image file into the 8-bit RGB grid every analyzer reads.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let image = image::open(path)?;
    into_rgb(image)
}

fn into_rgb(image: DynamicImage) -> Result<RgbImage> {
    let rgb = image.to_rgb8();
    ensure_not_empty(&rgb)?;
    Ok(rgb)
}

fn ensure_not_empty(image: &RgbImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ForensicsError::EmptyImage);
    }
    Ok(())
}

/// Score an already decoded image with the default configuration.
pub fn analyze(image: &RgbImage) -> Result<ForensicReport> {
    ensure_not_empty(image)?;
    let (frequency, noise, compression, color) =
        run_all(image, ScoringConfig::default().parallel)?;
    Ok(ForensicAggregator::new().combine(
        frequency.score,
        noise.score,
        compression.score,
        color.score,
    ))
}

fn run_analyzer<A: ScoreAnalyzer>(analyzer: &A, image: &RgbImage) -> Result<A::Output> {
    let output = analyzer.analyze(image)?;
    debug!(
        "{} analyzer ({}) score {:.4}",
        analyzer.name(),
        analyzer.description(),
        output.score()
    );
    Ok(output)
}

type AllResults = (FrequencyResult, NoiseResult, CompressionResult, ColorCorrelationResult);

/// Fan the four analyzers out over the same image and join on all of them.
fn run_all(image: &RgbImage, parallel: bool) -> Result<AllResults> {
    let frequency = || run_analyzer(&FrequencyAnalyzer::new(), image);
    let noise = || run_analyzer(&NoiseAnalyzer::new(), image);
    let compression = || run_analyzer(&CompressionAnalyzer::new(), image);
    let color = || run_analyzer(&ColorCorrelationAnalyzer::new(), image);

    let ((frequency, noise), (compression, color)) = if parallel {
        rayon::join(
            || rayon::join(frequency, noise),
            || rayon::join(compression, color),
        )
    } else {
        ((frequency(), noise()), (compression(), color()))
    };

    Ok((frequency?, noise?, compression?, color?))
}

pub struct ForensicsAnalyzer {
    original: RgbImage,
    config: ScoringConfig,
    aggregator: ForensicAggregator,
    path: Option<String>,
}

impl ForensicsAnalyzer {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let original = load(&path)?;

        Ok(Self {
            original,
            config: ScoringConfig::default(),
            aggregator: ForensicAggregator::new(),
            path: Some(path_str),
        })
    }

    pub fn from_image(image: DynamicImage) -> Result<Self> {
        Ok(Self {
            original: into_rgb(image)?,
            config: ScoringConfig::default(),
            aggregator: ForensicAggregator::new(),
            path: None,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_image(image::load_from_memory(bytes)?)
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_aggregator(mut self, aggregator: ForensicAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.original
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn analyze_frequency(&self) -> Result<FrequencyResult> {
        FrequencyAnalyzer::new().analyze(&self.original)
    }

    pub fn analyze_noise(&self) -> Result<NoiseResult> {
        NoiseAnalyzer::new().analyze(&self.original)
    }

    pub fn analyze_compression(&self) -> Result<CompressionResult> {
        CompressionAnalyzer::new().analyze(&self.original)
    }

    pub fn analyze_color_correlation(&self) -> Result<ColorCorrelationResult> {
        ColorCorrelationAnalyzer::new().analyze(&self.original)
    }

    pub fn full_analysis(&self) -> Result<FullAnalysisReport> {
        let (frequency, noise, compression, color) =
            run_all(&self.original, self.config.parallel)?;

        let report = self.aggregator.combine(
            frequency.score,
            noise.score,
            compression.score,
            color.score,
        );

        Ok(FullAnalysisReport {
            frequency,
            noise,
            compression,
            color,
            report,
        })
    }

    pub fn analyze(&self) -> Result<ForensicReport> {
        Ok(self.full_analysis()?.report)
    }
}

/// Final aggregate plus the four sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForensicReport {
    pub forensic_score: f64,
    pub frequency: f64,
    pub noise: f64,
    pub compression: f64,
    pub color_corr: f64,
}

impl ForensicReport {
    pub fn confidence(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.forensic_score)
    }
}

#[derive(Debug, Clone)]
pub struct FrequencyResult {
    pub score: f64,
    pub low_energy: f64,
    pub mid_energy: f64,
    pub high_energy: f64,
    pub balance: f64,
    /// Centered log-magnitude spectrum, min-max stretched to 8 bits.
    pub spectrum: GrayImage,
}

#[derive(Debug, Clone)]
pub struct NoiseResult {
    pub score: f64,
    pub residual_std: f64,
    pub laplacian_std: f64,
    pub residual_entropy: f64,
    /// Median residual offset to mid-gray.
    pub residual_map: GrayImage,
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub score: f64,
    pub block_count: usize,
    pub block_variance_spread: f64,
    pub error_map: GrayImage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCorrelationResult {
    pub score: f64,
    pub rg: f64,
    pub rb: f64,
    pub gb: f64,
}

macro_rules! impl_scored {
    ($($ty:ty),*) => {
        $(impl Scored for $ty {
            fn score(&self) -> f64 {
                self.score
            }
        })*
    };
}

impl_scored!(FrequencyResult, NoiseResult, CompressionResult, ColorCorrelationResult);

#[derive(Debug, Clone)]
pub struct FullAnalysisReport {
    pub frequency: FrequencyResult,
    pub noise: NoiseResult,
    pub compression: CompressionResult,
    pub color: ColorCorrelationResult,
    pub report: ForensicReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn describe<A: ScoreAnalyzer>(analyzer: &A) -> (String, String) {
        (analyzer.name().to_string(), analyzer.description().to_string())
    }

    #[test]
    fn test_analyzers_describe_themselves() {
        let described = [
            describe(&FrequencyAnalyzer::new()),
            describe(&NoiseAnalyzer::new()),
            describe(&CompressionAnalyzer::new()),
            describe(&ColorCorrelationAnalyzer::new()),
        ];

        for (i, (name, description)) in described.iter().enumerate() {
            assert!(!name.is_empty() && !description.is_empty());
            assert!(described.iter().skip(i + 1).all(|(other, _)| other != name));
        }
    }

    #[test]
    fn test_free_analyze_matches_default_analyzer() {
        let image =
            RgbImage::from_fn(20, 12, |x, y| Rgb([(x * 12) as u8, (y * 20) as u8, 90]));
        let from_fn = analyze(&image).unwrap();
        let from_analyzer = ForensicsAnalyzer::from_image(DynamicImage::ImageRgb8(image))
            .unwrap()
            .analyze()
            .unwrap();

        assert_eq!(from_fn, from_analyzer);
    }

    #[test]
    fn test_empty_grid_rejected_by_both_entry_points() {
        assert!(matches!(
            ensure_not_empty(&RgbImage::new(4, 0)),
            Err(ForensicsError::EmptyImage)
        ));
        assert!(matches!(
            ForensicsAnalyzer::from_image(DynamicImage::new_rgb8(0, 3)),
            Err(ForensicsError::EmptyImage)
        ));
        assert!(ensure_not_empty(&RgbImage::new(1, 1)).is_ok());
    }
}
