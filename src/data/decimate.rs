//! Opt-in thinning of the measurement axis.
//!
//! One pass drops measurement columns `0, 2, 4, ...` from every channel, so
//! `M` becomes `M / 2`. It is lossy and order dependent, and only runs when
//! the configuration asks for it.

use log::{debug, warn};

use super::loader::RawRecord;

/// Apply up to `passes` decimation passes to `raw` in place.
///
/// Returns the number of passes actually applied. A pass that would leave no
/// measurement column is not applied, and no further passes run.
pub fn decimate(raw: &mut RawRecord, passes: u32) -> u32 {
    for applied in 0..passes {
        if raw.meas_count < 2 {
            warn!(
                "decimation stopped after {applied} of {passes} passes: only {} measurement(s) left",
                raw.meas_count
            );
            return applied;
        }
        let meas = raw.meas_count;
        for buffer in raw.buffers.values_mut() {
            *buffer = drop_even_columns(buffer, meas);
        }
        raw.meas_count = meas / 2;
        debug!("decimation pass {}: {meas} -> {} measurements", applied + 1, raw.meas_count);
    }
    passes
}

/// Keep the odd columns of a level-major buffer with `meas` columns per row.
fn drop_even_columns(buffer: &[f64], meas: usize) -> Vec<f64> {
    buffer
        .chunks_exact(meas)
        .flat_map(|row| row.iter().skip(1).step_by(2).copied())
        .collect()
}
