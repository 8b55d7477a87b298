//! Synthesizes boundary filters for random surfaces and reports how the
//! three stability methods voted.
//!
//! ```shell
//! RUST_LOG=info cargo run --example stability_sweep --release -- 5000
//! ```

use math_audio_boundary_filter::*;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn print_response(name: &str, filter: &BoundaryFilter) {
    let freqs = Array1::logspace(10.0, 20.0_f64.log10(), 20000.0_f64.log10(), 12);
    let response = filter.reflectance.np_log_magnitude(&freqs, filter.sample_rate);

    println!("{} (order {}):", name, filter.order());
    for bq in &filter.bands {
        println!("   {}", bq);
    }
    for (f, db) in freqs.iter().zip(response.iter()) {
        println!("   {:>8.1} Hz  {:>7.2} dB", f, db);
    }
}

fn main() {
    env_logger::init();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    println!("Boundary filter stability sweep");
    println!("===============================");

    let design = FilterDesign::default();
    let flat = SurfaceDescriptor::uniform(0.9, design.bands()).unwrap();
    let filter = synthesize_boundary(&flat, SRATE, &design).unwrap();
    print_response("\nflat 0.9", &filter);

    let mut rng = StdRng::seed_from_u64(42);
    let presets: Vec<SurfacePreset> = (0..count)
        .map(|i| {
            let absorption: Vec<f64> = (0..design.bands())
                .map(|_| rng.random_range(0.01..0.99))
                .collect();
            SurfacePreset::new(
                format!("random-{i}"),
                SurfaceDescriptor::from_absorption(&absorption).unwrap(),
            )
        })
        .collect();

    let results = synthesize_batch(&presets, SRATE, &design);

    let mut synthesized = 0;
    let mut mismatches = 0;
    let mut unstable = 0;
    for (name, result) in &results {
        match result {
            Ok(_) => synthesized += 1,
            Err(BoundaryFilterError::StabilityMismatch { verdicts, .. }) => {
                mismatches += 1;
                println!("{}: methods disagree ({})", name, verdicts);
            }
            Err(e) if e.is_stability_error() => unstable += 1,
            Err(e) => println!("{}: {}", name, e),
        }
    }

    println!("\nSurfaces:       {}", count);
    println!("Synthesized:    {}", synthesized);
    println!("Unstable:       {}", unstable);
    println!("Disagreements:  {}", mismatches);

    let directions = [
        IncidenceDirection::NORMAL,
        IncidenceDirection::from_degrees(45.0, 45.0).unwrap(),
    ];
    match CoefficientSet::from_batch(&results[..results.len().min(3)], &directions) {
        Ok(set) => match set.to_json_string() {
            Ok(json) => println!("\nFirst exports:\n{}", json),
            Err(e) => println!("export failed: {}", e),
        },
        Err(e) => println!("export failed: {}", e),
    }
}
