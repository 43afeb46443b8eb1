/// Data layer: ingestion of rig record files and derived quantities.
///
/// Architecture:
/// ```text
///   <data_dir>/<name>.xml
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  tagged record → flat buffers + (M, L)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ decimate  │  optional: drop alternate measurement columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  shaper   │  flat buffers → [levels, meas] grids
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  time channel rebased to 0
///   └───────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ MeasurementSet  │  ── resistivity → adds derived channel
///   └────────────────┘
/// ```
///
/// `pipeline` strings the stages together so a set is only ever observed
/// fully built.

pub mod decimate;
pub mod loader;
pub mod model;
mod normalize;
pub mod pipeline;
pub mod resistivity;
pub mod shaper;
