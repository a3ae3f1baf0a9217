//! Score Image Example
//!
//! Decodes an image, runs the four forensic analyzers and prints the JSON report.
//!
//! Run with: cargo run --example score_image -- <image_path>

use std::env;

use synth_forensics::{ForensicsAnalyzer, error::Result, report::JsonReport};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: {} <image_path>", args[0]);
        return Ok(());
    }

    let analyzer = ForensicsAnalyzer::new(&args[1])?;
    let full = analyzer.full_analysis()?;

    println!("{}", JsonReport::from(&full).to_json()?);
    println!(
        "Forensic score: {:.1}% ({})",
        full.report.forensic_score * 100.0,
        full.report.confidence().label()
    );

    Ok(())
}
