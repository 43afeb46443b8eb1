use std::collections::BTreeMap;

use ndarray::Array2;

use super::loader::RawRecord;
use super::model::Channel;
use crate::error::{LoadError, Result};

/// Lay out a flat level-major buffer as a `[levels, meas]` grid.
///
/// Element `(level, meas)` is `buffer[level * meas_count + meas]`.
pub fn reshape(
    channel: Channel,
    buffer: Vec<f64>,
    levels: usize,
    meas: usize,
) -> Result<Array2<f64>> {
    let len = buffer.len();
    if Some(len) != levels.checked_mul(meas) {
        return Err(LoadError::Reshape {
            channel,
            len,
            levels,
            meas,
        });
    }
    Array2::from_shape_vec((levels, meas), buffer).map_err(|_| LoadError::Reshape {
        channel,
        len,
        levels,
        meas,
    })
}

/// Reshape every buffer of a raw record into its grid.
pub fn shape_record(raw: RawRecord) -> Result<BTreeMap<Channel, Array2<f64>>> {
    let (levels, meas) = raw.dims();
    raw.buffers
        .into_iter()
        .map(|(channel, buffer)| Ok((channel, reshape(channel, buffer, levels, meas)?)))
        .collect()
}
