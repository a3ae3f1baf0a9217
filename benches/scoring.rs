use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use synth_forensics::{
    analysis::{
        color_correlation::ColorCorrelationAnalyzer, compression::CompressionAnalyzer,
        frequency::FrequencyAnalyzer, noise::NoiseAnalyzer,
    },
    analyze,
    detection::ScoreAnalyzer,
};

fn textured_image(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let v = ((x * 31 + y * 17) ^ (x * y)) as u8;
        Rgb([v, v.wrapping_add(40), v.wrapping_mul(3)])
    })
}

fn bench_analyzers(c: &mut Criterion) {
    let image = textured_image(512);

    c.bench_function("frequency_512", |b| {
        b.iter(|| FrequencyAnalyzer::new().analyze(black_box(&image)))
    });
    c.bench_function("noise_512", |b| {
        b.iter(|| NoiseAnalyzer::new().analyze(black_box(&image)))
    });
    c.bench_function("compression_512", |b| {
        b.iter(|| CompressionAnalyzer::new().analyze(black_box(&image)))
    });
    c.bench_function("color_correlation_512", |b| {
        b.iter(|| ColorCorrelationAnalyzer::new().analyze(black_box(&image)))
    });
    c.bench_function("full_pipeline_512", |b| b.iter(|| analyze(black_box(&image))));
}

criterion_group!(benches, bench_analyzers);
criterion_main!(benches);
