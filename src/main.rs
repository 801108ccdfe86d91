use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use thz_export::config::Overrides;

/// Merge every .t2t scan under a folder into one table.
///
/// With no arguments, reads `Sample_Data/` and writes `output.csv`.
#[derive(Parser)]
#[command(author, version)]
struct Cli {
    #[command(flatten)]
    settings: Overrides,

    /// Also write a JSON summary of exported, skipped and failed files
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = cli.settings.resolve()?;
    info!("Exporting {} → {}", cfg.root.display(), cfg.output.display());

    let report = thz_export::run(&cfg)
        .with_context(|| format!("exporting scans under {}", cfg.root.display()))?;

    if let Some(path) = cli.report {
        report
            .write_json(&path)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !report.skipped.is_empty() || !report.failed.is_empty() {
        info!(
            "{} file(s) skipped for their folder name, {} dropped after errors",
            report.skipped.len(),
            report.failed.len()
        );
    }
    println!("Data saved to {}", cfg.output.display());
    Ok(())
}
