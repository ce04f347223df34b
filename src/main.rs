use anyhow::Result;

use rust_ttc::config::FusionConfig;
use rust_ttc::error::{Degeneracy, FusionError};
use rust_ttc::io::sequence::{SequenceDataset, TtcRecord, write_results_csv};
use rust_ttc::system::FusionSystem;

fn fmt_ttc(estimate: &Result<f64, FusionError>) -> String {
    match estimate {
        Ok(ttc) => format!("{:7.2} s", ttc),
        Err(FusionError::InsufficientData { .. }) => "  (sparse)".to_string(),
        Err(FusionError::DegenerateGeometry(Degeneracy::NoRelativeMotion)) => {
            "       inf".to_string()
        }
        Err(e) => format!("  ({})", e),
    }
}


fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let dataset_path = args.next().unwrap_or_else(|| "data/sequence".to_string());
    let config = match args.next() {
        Some(path) => FusionConfig::load(&path)?,
        None => FusionConfig::default(),
    };
    let output_path = args.next();

    println!("Loading sequence from: {}", dataset_path);
    let dataset = SequenceDataset::new(&dataset_path)?;
    println!("Loaded {} frames", dataset.len());

    let mut system = FusionSystem::new(dataset, config)?;
    let mut records = Vec::new();
    let mut failed_steps = 0usize;

    while let Some(step) = system.next_step() {
        let result = match step {
            Ok(result) => result,
            // a bad frame does not end the run, a load failure does
            Err(e) if e.downcast_ref::<FusionError>().is_some() => {
                println!("Step failed: {:#}", e);
                failed_steps += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        for object in &result.tracked {
            println!(
                "frame {:>6}  {} -> {}  TTC range {}  TTC camera {}  ({} / {} pts, {} matches)",
                result.frame_id,
                object.prev_box_id,
                object.curr_box_id,
                fmt_ttc(&object.ttc_range),
                fmt_ttc(&object.ttc_vision),
                object.n_range_points_prev,
                object.n_range_points_curr,
                object.n_correspondences,
            );
            records.push(TtcRecord::from_tracked(result.frame_id, object));
        }
    }

    println!(
        "Processed {} steps ({} failed), {} TTC records",
        system.tracker().frame_count(),
        failed_steps,
        records.len()
    );

    if let Some(path) = output_path {
        write_results_csv(&path, &records)?;
        println!("Wrote {}", path);
    }

    Ok(())
}
