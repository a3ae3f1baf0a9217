use image::{DynamicImage, Rgb, RgbImage};
use synth_forensics::{
    ForensicsAnalyzer, ScoringConfig, analyze,
    detection::aggregator::{AggregatorWeights, ForensicAggregator},
    error::ForensicsError,
    report::JsonReport,
};

/// Deterministic xorshift noise so range checks cover busy, colorful content.
fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state & 0xff) as u8
    };
    RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]))
}

fn in_unit_range(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

#[test]
fn uniform_gray_image_scores_low() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    RgbImage::from_pixel(64, 64, Rgb([128, 128, 128])).save(&path).unwrap();

    let analyzer = ForensicsAnalyzer::new(&path).unwrap();
    assert!(analyzer.path().is_some_and(|p| p.ends_with("gray.png")));
    let full = analyzer.full_analysis().unwrap();
    let report = full.report;

    assert_eq!(report.color_corr, 0.5);
    assert!(report.compression < 0.05, "compression {}", report.compression);
    assert!(report.frequency < 0.05, "frequency {}", report.frequency);
    assert!(report.noise < 0.05, "noise {}", report.noise);
    assert!(report.forensic_score < 0.5);
    assert_eq!(full.compression.block_count, 64);
}

#[test]
fn scores_stay_in_unit_range_for_all_sizes() {
    let sizes = [(1, 1), (2, 2), (3, 5), (7, 9), (8, 8), (17, 31), (64, 48)];

    for (i, &(w, h)) in sizes.iter().enumerate() {
        for image in [
            noise_image(w, h, 0x9e37_79b9 + i as u64),
            RgbImage::from_pixel(w, h, Rgb([0, 0, 0])),
            RgbImage::from_pixel(w, h, Rgb([255, 255, 255])),
        ] {
            let report = analyze(&image).unwrap();
            for v in [
                report.forensic_score,
                report.frequency,
                report.noise,
                report.compression,
                report.color_corr,
            ] {
                assert!(in_unit_range(v), "{w}x{h}: {report:?}");
            }
        }
    }
}

#[test]
fn identical_bytes_give_identical_scores() {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(noise_image(40, 30, 7))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let first = ForensicsAnalyzer::from_bytes(&bytes).unwrap().analyze().unwrap();
    let second = ForensicsAnalyzer::from_bytes(&bytes).unwrap().analyze().unwrap();

    assert_eq!(first.forensic_score.to_bits(), second.forensic_score.to_bits());
    assert_eq!(first, second);
}

#[test]
fn sequential_and_parallel_agree() {
    let image = DynamicImage::ImageRgb8(noise_image(33, 20, 99));
    let parallel = ForensicsAnalyzer::from_image(image.clone()).unwrap().analyze().unwrap();
    let sequential = ForensicsAnalyzer::from_image(image)
        .unwrap()
        .with_config(ScoringConfig::default().with_parallel(false))
        .analyze()
        .unwrap();

    assert_eq!(parallel, sequential);
}

#[test]
fn aggregate_matches_weighted_sum_of_sub_scores() {
    let image = noise_image(48, 48, 3);
    let report = analyze(&image).unwrap();
    let expected = (0.35 * report.frequency
        + 0.30 * report.noise
        + 0.20 * report.compression
        + 0.15 * report.color_corr)
        .clamp(0.0, 1.0);

    assert!((report.forensic_score - expected).abs() < 1e-9);
    assert_eq!(
        ForensicAggregator::new().combine(
            report.frequency,
            report.noise,
            report.compression,
            report.color_corr
        ),
        report
    );
}

#[test]
fn custom_aggregator_is_used() {
    let weights = AggregatorWeights {
        frequency: 0.0,
        noise: 0.0,
        compression: 0.0,
        color_corr: 1.0,
    };
    let report = ForensicsAnalyzer::from_image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        16,
        16,
        Rgb([10, 20, 30]),
    )))
    .unwrap()
    .with_aggregator(ForensicAggregator::with_weights(weights).unwrap())
    .analyze()
    .unwrap();

    assert_eq!(report.forensic_score, 0.5);
}

#[test]
fn sub_block_image_gets_neutral_compression_score() {
    let report = analyze(&noise_image(4, 4, 11)).unwrap();
    assert_eq!(report.compression, 0.5);
}

#[test]
fn missing_file_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ForensicsAnalyzer::new(dir.path().join("absent.png"));
    assert!(matches!(result, Err(ForensicsError::ImageLoad(_))));
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(ForensicsAnalyzer::new(&path), Err(ForensicsError::ImageLoad(_))));
    assert!(matches!(
        ForensicsAnalyzer::from_bytes(b"\x00\x01\x02"),
        Err(ForensicsError::ImageLoad(_))
    ));
}

#[test]
fn empty_image_is_rejected() {
    let result = ForensicsAnalyzer::from_image(DynamicImage::new_rgb8(0, 0));
    assert!(matches!(result, Err(ForensicsError::EmptyImage)));
    assert!(matches!(analyze(&RgbImage::new(0, 5)), Err(ForensicsError::EmptyImage)));
}

#[test]
fn json_report_and_diagnostic_maps() {
    let image = noise_image(32, 24, 5);
    let analyzer = ForensicsAnalyzer::from_image(DynamicImage::ImageRgb8(image)).unwrap();
    let full = analyzer.full_analysis().unwrap();

    let json = JsonReport::from(&full).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!((value["forensic_score"].as_f64().unwrap() - full.report.forensic_score).abs() < 1e-12);
    assert_eq!(value["compression_analysis"]["block_count"].as_u64(), Some(12));

    assert_eq!(full.frequency.spectrum.dimensions(), (256, 256));
    assert_eq!(full.noise.residual_map.dimensions(), (32, 24));
    assert_eq!(full.compression.error_map.dimensions(), (32, 24));
}
