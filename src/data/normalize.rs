use std::collections::BTreeMap;

use ndarray::Array2;

use super::model::Channel;

/// Rebase the time channel so its first sample is `0.0`.
///
/// Crate-private: the ingestion pipeline calls it exactly once while building
/// a set, and a built set exposes no mutable access to its grids.
pub(crate) fn rebase_time(grids: &mut BTreeMap<Channel, Array2<f64>>) {
    let Some(time) = grids.get_mut(&Channel::TIME) else {
        return;
    };
    let Some(origin) = time.get([0, 0]).copied() else {
        return;
    };
    time.mapv_inplace(|t| t - origin);
}
