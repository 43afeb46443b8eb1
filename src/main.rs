use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, error, info};

use lt_analysis::{logging, process_dataset, Channel, Settings};

/// Ingest liquid-level test rig logs and derive resistivity.
#[derive(Parser, Debug)]
#[command(name = "lt-analysis", version, about)]
struct Cli {
    /// JSON settings file; omitted keys keep their defaults.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Directory holding the record files.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Full-scale level in mm (resistivity threshold).
    #[arg(long, value_name = "MM")]
    max_level: Option<f64>,

    /// Thin the measurement axis before processing; a bare flag means 3 passes.
    #[arg(long, value_name = "PASSES", num_args = 0..=1, default_missing_value = "3")]
    decimate: Option<u32>,

    /// Dataset names to process instead of the configured list.
    #[arg(value_name = "DATASET")]
    datasets: Vec<String>,
}

impl Cli {
    fn into_settings(self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(dir) = self.data_dir {
            settings.data_dir = dir;
        }
        if let Some(level) = self.max_level {
            settings.lt_max_level = level;
        }
        if let Some(passes) = self.decimate {
            settings.decimation_passes = passes;
        }
        if !self.datasets.is_empty() {
            settings.data_files = self.datasets;
        }
        settings.validate().context("invalid settings")?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let settings = Cli::parse().into_settings()?;
    logging::init(&settings.logging);
    debug!("lt-analysis {}", env!("CARGO_PKG_VERSION"));

    let calculator = settings
        .calculator()
        .context("lt_max_level must be a positive finite number")?;
    let options = settings.ingest_options();

    let mut failed = Vec::new();
    for source in settings.sources() {
        let start = Instant::now();
        match process_dataset(&source, &options, &calculator) {
            Ok((set, report)) => {
                info!(
                    "{}: {} levels x {} measurements, {:.1} s of data, {}/{} resistivity values undefined",
                    set.name(),
                    set.level_count(),
                    set.meas_count(),
                    set.time_span().unwrap_or(0.0),
                    report.undefined,
                    report.total
                );
                for (channel, grid) in set.channels().filter(|(c, _)| *c != Channel::TIME) {
                    let (lo, hi) = grid
                        .iter()
                        .filter(|v| !v.is_nan())
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                            (lo.min(v), hi.max(v))
                        });
                    debug!("{}: {channel} range [{lo}, {hi}]", set.name());
                }
                debug!(
                    "Processing time for {} : {:0.1} s",
                    set.name(),
                    start.elapsed().as_secs_f64()
                );
            }
            Err(err) => {
                error!("{}: {:#}", source.name, anyhow::Error::from(err));
                failed.push(source.name);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} dataset(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
