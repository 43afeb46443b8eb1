use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::Channel;

/// Everything that can abort ingestion of one dataset.
///
/// All variants are fatal for the file being loaded: no partially populated
/// [`MeasurementSet`](crate::data::model::MeasurementSet) is ever handed out.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is missing, unreadable, or not the expected tagged structure.
    #[error("invalid input {path}: {reason}")]
    InputFormat { path: PathBuf, reason: String },

    /// A channel body does not hold `M × L` tokens.
    #[error("channel {channel}: expected {expected} values, found {found}")]
    MalformedPayload {
        channel: Channel,
        expected: usize,
        found: usize,
    },

    /// Two channels declare different `(M, L)` size descriptors.
    #[error(
        "channel {second} declares size {second_dims:?} but {first} declares {first_dims:?}"
    )]
    ShapeMismatch {
        first: Channel,
        first_dims: (usize, usize),
        second: Channel,
        second_dims: (usize, usize),
    },

    /// A flat buffer could not be laid out as a `[levels, meas]` grid.
    #[error("channel {channel}: cannot reshape {len} values into [{levels}, {meas}]")]
    Reshape {
        channel: Channel,
        len: usize,
        levels: usize,
        meas: usize,
    },
}

impl LoadError {
    pub(crate) fn input_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InputFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_format_display_names_the_file() {
        let err = LoadError::input_format("/data/LT01.xml", "missing size attribute");
        assert_eq!(
            err.to_string(),
            "invalid input /data/LT01.xml: missing size attribute"
        );
    }

    #[test]
    fn shape_mismatch_names_both_channels() {
        let err = LoadError::ShapeMismatch {
            first: Channel::LevelMm,
            first_dims: (4, 2),
            second: Channel::CurrentA,
            second_dims: (3, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("Level_mm"));
        assert!(msg.contains("Current_A"));
    }
}
