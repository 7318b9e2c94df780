use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use mlvtx::data::loader::load_modes;
use mlvtx::metadata::{resolve, InferenceSample};
use mlvtx::prediction::{load_predictions, Coordinate};
use mlvtx::resolution::{output_dir, ResolutionSummary};

const USAGE: &str = "usage: resolution_summary <pred.csv> <test-file> <x|y|z> <outdir> [nonswap|fluxswap]";

/// Summarise the vertex resolution of one coordinate for a prediction CSV.
///
/// `<test-file>` is the record file the predictions were made on and
/// supplies the interaction mode of each event. Any `{}` placeholders in it
/// are filled with detector, horn and flux of the prediction file.
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 || args.len() > 5 {
        bail!(USAGE);
    }
    let pred_file = PathBuf::from(&args[0]);
    let coordinate: Coordinate = args[2].parse().map_err(anyhow::Error::msg)?;
    let outdir = PathBuf::from(&args[3]);
    let inference = match args.get(4).map(String::as_str) {
        None => None,
        Some("nonswap") => Some(InferenceSample::Nonswap),
        Some("fluxswap") => Some(InferenceSample::Fluxswap),
        Some(other) => bail!("unknown inference sample '{other}'\n{USAGE}"),
    };

    let sample = resolve(&pred_file.to_string_lossy())?.for_inference(inference)?;
    let test_file = PathBuf::from(sample.fill_template(&args[1]));
    info!("test file: {}", test_file.display());

    let predictions = load_predictions(&pred_file, coordinate)?;
    let modes = load_modes(&test_file)
        .with_context(|| format!("reading interaction modes from {}", test_file.display()))?;

    let summary = ResolutionSummary::compute(sample, &predictions, &modes)?;
    let dir = output_dir(&outdir, &file_stem(&pred_file))?;
    let path = summary.write_json(&dir)?;

    println!(
        "{} {}: E.A. mean {:.2} cm, RMS {:.2} cm | model mean {:.2} cm, RMS {:.2} cm",
        sample,
        coordinate,
        summary.all.elastic_arms.residual.mean,
        summary.all.elastic_arms.residual.rms,
        summary.all.model.residual.mean,
        summary.all.model.residual.rms,
    );
    for entry in &summary.per_mode {
        println!(
            "  {:<20} {:>8} events | mean |diff| E.A. {:.2} cm, model {:.2} cm",
            entry.mode.name(),
            entry.stats.events,
            entry.stats.elastic_arms.mean_abs,
            entry.stats.model.mean_abs,
        );
    }
    println!("Wrote {}", path.display());
    Ok(())
}

/// Filename without directory or extension.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "predictions".to_string())
}
