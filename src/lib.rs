//! Ingestion and resistivity derivation for liquid-level test rig logs.
//!
//! A record file is turned into a [`MeasurementSet`](data::model::MeasurementSet)
//! of `[level_count, meas_count]` grids by [`data::pipeline::ingest`]; the
//! derived resistivity channel is added with
//! [`MeasurementSet::compute_resistivity`](data::model::MeasurementSet::compute_resistivity).

pub mod data;
pub mod error;
pub mod logging;
pub mod settings;

pub use data::model::{Channel, MeasurementSet};
pub use data::pipeline::{ingest, process_dataset, DatasetSource, IngestOptions};
pub use data::resistivity::{ResistivityCalculator, ResistivityReport};
pub use error::LoadError;
pub use settings::Settings;
