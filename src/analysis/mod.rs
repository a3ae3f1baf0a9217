pub mod color_correlation;
pub mod compression;
pub mod frequency;
pub mod noise;
