use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use mlvtx::{load_dataset, resolve, LoadOptions};

/// Load a directory of record files and report what was found.
///
/// Usage: `mlvtx <data-dir> [loader-config.json]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next().map(PathBuf::from) else {
        bail!("usage: mlvtx <data-dir> [loader-config.json]");
    };
    let options = match args.next() {
        Some(config) => LoadOptions::from_json_file(&PathBuf::from(config))?,
        None => LoadOptions::default(),
    };

    // A directory name without sample metadata is still loadable.
    match resolve(&dir.to_string_lossy()) {
        Ok(sample) => info!("sample: {sample}"),
        Err(err) => warn!("{err}"),
    }

    let dataset = load_dataset(&dir, &options)
        .with_context(|| format!("loading {}", dir.display()))?;
    if let Err(err) = dataset.check_consistency() {
        warn!("{err}");
    }

    println!(
        "Loaded {} files, and {} total events.",
        dataset.totals.files, dataset.totals.events
    );
    for field in dataset.fields.requested() {
        let chunks = dataset.fields.chunk_count(field).unwrap_or(0);
        let gaps = dataset.report.field_gaps.get(&field).copied().unwrap_or(0);
        println!("  {field:<12} {chunks} chunks, {gaps} gaps");
    }
    if !dataset.report.skipped.is_empty() {
        println!("Skipped {} entries", dataset.report.skipped.len());
    }
    for failure in &dataset.report.failures {
        println!("Failed {}: {}", failure.path.display(), failure.reason);
    }
    Ok(())
}
