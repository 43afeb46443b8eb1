use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::debug;

use super::decimate::decimate;
use super::loader::{self, RawRecord};
use super::model::MeasurementSet;
use super::normalize::rebase_time;
use super::resistivity::{ResistivityCalculator, ResistivityReport};
use super::shaper::shape_record;
use crate::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One dataset to ingest: its identifier and the file holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub name: String,
    pub path: PathBuf,
}

impl DatasetSource {
    /// Resolve `<data_dir>/<name>.<extension>`.
    pub fn locate(data_dir: &Path, name: &str, extension: &str) -> Self {
        DatasetSource {
            name: name.to_string(),
            path: data_dir.join(format!("{name}.{extension}")),
        }
    }
}

/// Optional pre-processing applied during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Decimation passes applied before shaping; `0` disables decimation.
    pub decimation_passes: u32,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Load, shape and time-normalize one dataset.
///
/// Either every stage succeeds and a complete set is returned, or the first
/// failure is returned and nothing else is produced.
pub fn ingest(source: &DatasetSource, options: &IngestOptions) -> Result<MeasurementSet> {
    debug!("Processing {} ({})", source.name, source.path.display());
    let raw = loader::load_raw(&source.path)?;
    build(source, raw, options)
}

/// Like [`ingest`], but reads the document from `input` instead of opening
/// `source.path`.
pub fn ingest_reader<R: BufRead>(
    source: &DatasetSource,
    input: R,
    options: &IngestOptions,
) -> Result<MeasurementSet> {
    let raw = loader::parse_raw(input, &source.path)?;
    build(source, raw, options)
}

/// Ingest a dataset and derive its resistivity channel.
pub fn process_dataset(
    source: &DatasetSource,
    options: &IngestOptions,
    calculator: &ResistivityCalculator,
) -> Result<(MeasurementSet, ResistivityReport)> {
    let mut set = ingest(source, options)?;
    let report = set.compute_resistivity(calculator).ok_or_else(|| {
        LoadError::input_format(&source.path, "level or resistance channel missing")
    })?;
    Ok((set, report))
}

fn build(
    source: &DatasetSource,
    mut raw: RawRecord,
    options: &IngestOptions,
) -> Result<MeasurementSet> {
    if options.decimation_passes > 0 {
        decimate(&mut raw, options.decimation_passes);
    }
    let (level_count, meas_count) = raw.dims();
    let mut grids = shape_record(raw)?;
    rebase_time(&mut grids);
    MeasurementSet::from_grids(&source.name, &source.path, level_count, meas_count, grids)
}
