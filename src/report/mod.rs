use serde::Serialize;

use crate::{FullAnalysisReport, detection::ConfidenceLevel, error::Result};

#[derive(Serialize)]
pub struct JsonReport {
    pub forensic_score: f64,
    pub confidence: ConfidenceLevel,
    pub verdict: String,
    pub frequency_analysis: FrequencyReportSection,
    pub noise_analysis: NoiseReportSection,
    pub compression_analysis: CompressionReportSection,
    pub color_analysis: ColorReportSection,
}

#[derive(Serialize)]
pub struct FrequencyReportSection {
    pub score: f64,
    pub low_energy: f64,
    pub mid_energy: f64,
    pub high_energy: f64,
    pub balance: f64,
}

#[derive(Serialize)]
pub struct NoiseReportSection {
    pub score: f64,
    pub residual_std: f64,
    pub laplacian_std: f64,
    pub residual_entropy: f64,
}

#[derive(Serialize)]
pub struct CompressionReportSection {
    pub score: f64,
    pub block_count: usize,
    pub block_variance_spread: f64,
}

#[derive(Serialize)]
pub struct ColorReportSection {
    pub score: f64,
    pub rg_correlation: f64,
    pub rb_correlation: f64,
    pub gb_correlation: f64,
}

impl From<&FullAnalysisReport> for JsonReport {
    fn from(report: &FullAnalysisReport) -> Self {
        let confidence = report.report.confidence();

        Self {
            forensic_score: report.report.forensic_score,
            confidence,
            verdict: confidence.label().to_string(),
            frequency_analysis: FrequencyReportSection {
                score: report.frequency.score,
                low_energy: report.frequency.low_energy,
                mid_energy: report.frequency.mid_energy,
                high_energy: report.frequency.high_energy,
                balance: report.frequency.balance,
            },
            noise_analysis: NoiseReportSection {
                score: report.noise.score,
                residual_std: report.noise.residual_std,
                laplacian_std: report.noise.laplacian_std,
                residual_entropy: report.noise.residual_entropy,
            },
            compression_analysis: CompressionReportSection {
                score: report.compression.score,
                block_count: report.compression.block_count,
                block_variance_spread: report.compression.block_variance_spread,
            },
            color_analysis: ColorReportSection {
                score: report.color.score,
                rg_correlation: report.color.rg,
                rb_correlation: report.color.rb,
                gb_correlation: report.color.gb,
            },
        }
    }
}

impl JsonReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
