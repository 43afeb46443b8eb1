use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::resistivity::{ResistivityCalculator, ResistivityReport};
use crate::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// Channel – one named per-(level, measurement) series
// ---------------------------------------------------------------------------

/// The channels a measurement set can hold.
///
/// Ordering follows declaration order so `BTreeMap<Channel, _>` iterates the
/// raw channels in the rig's native tag order, with the derived channel last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    LevelMm,
    VoltageV,
    /// Time axis, as stamped by the Keithley source meter.
    KeithleyTimeStamp,
    CurrentA,
    ResistanceOhm,
    /// Derived from `Resistance_ohm` and `Level_mm`; never read from file.
    Resistivity,
}

impl Channel {
    /// Channels read from the record file, in tag order.
    pub const RAW: [Channel; 5] = [
        Channel::LevelMm,
        Channel::VoltageV,
        Channel::KeithleyTimeStamp,
        Channel::CurrentA,
        Channel::ResistanceOhm,
    ];

    /// The channel holding the time axis.
    pub const TIME: Channel = Channel::KeithleyTimeStamp;

    /// The tag (or derived-channel name) this channel is known by.
    pub fn name(self) -> &'static str {
        match self {
            Channel::LevelMm => "Level_mm",
            Channel::VoltageV => "Voltage_V",
            Channel::KeithleyTimeStamp => "KeithleyTimeStamp",
            Channel::CurrentA => "Current_A",
            Channel::ResistanceOhm => "Resistance_ohm",
            Channel::Resistivity => "resistivity",
        }
    }

    /// Map a record-file tag to a raw channel.
    ///
    /// The derived channel is never produced here, even if a file happens to
    /// carry a `resistivity` tag.
    pub fn from_tag(tag: &str) -> Option<Channel> {
        Channel::RAW.into_iter().find(|c| c.name() == tag)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// MeasurementSet – one fully ingested record file
// ---------------------------------------------------------------------------

/// All channels of one dataset, each a `[level_count, meas_count]` grid.
///
/// Row `i` of every grid holds the measurements taken at level step `i`.
/// Sets are only built by the ingestion pipeline, which has already rebased
/// the time channel; afterwards the only mutation is adding the derived
/// resistivity channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    name: String,
    source: PathBuf,
    level_count: usize,
    meas_count: usize,
    channels: BTreeMap<Channel, Array2<f64>>,
}

impl MeasurementSet {
    /// Assemble a set, re-checking that every grid is `[level_count, meas_count]`.
    pub(crate) fn from_grids(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        level_count: usize,
        meas_count: usize,
        channels: BTreeMap<Channel, Array2<f64>>,
    ) -> Result<Self> {
        for (&channel, grid) in &channels {
            if grid.dim() != (level_count, meas_count) {
                return Err(LoadError::Reshape {
                    channel,
                    len: grid.len(),
                    levels: level_count,
                    meas: meas_count,
                });
            }
        }
        Ok(MeasurementSet {
            name: name.into(),
            source: source.into(),
            level_count,
            meas_count,
            channels,
        })
    }

    /// Dataset identifier, e.g. `LT01`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the set was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    pub fn meas_count(&self) -> usize {
        self.meas_count
    }

    /// `(level_count, meas_count)`, the shape shared by every channel.
    pub fn shape(&self) -> (usize, usize) {
        (self.level_count, self.meas_count)
    }

    pub fn channel(&self, channel: Channel) -> Option<&Array2<f64>> {
        self.channels.get(&channel)
    }

    /// All present channels, raw channels first.
    pub fn channels(&self) -> impl Iterator<Item = (Channel, &Array2<f64>)> {
        self.channels.iter().map(|(c, g)| (*c, g))
    }

    /// The derived channel, once [`compute_resistivity`](Self::compute_resistivity) ran.
    pub fn resistivity(&self) -> Option<&Array2<f64>> {
        self.channel(Channel::Resistivity)
    }

    /// Largest rebased timestamp, i.e. the duration covered by the set.
    pub fn time_span(&self) -> Option<f64> {
        self.channel(Channel::TIME)
            .map(|t| t.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Derive the `resistivity` channel and store it in the set.
    ///
    /// Returns `None` when `Resistance_ohm` or `Level_mm` is absent or the two
    /// differ in shape. Running it again replaces the previous result.
    pub fn compute_resistivity(
        &mut self,
        calculator: &ResistivityCalculator,
    ) -> Option<ResistivityReport> {
        let level = self.channels.get(&Channel::LevelMm)?;
        let resistance = self.channels.get(&Channel::ResistanceOhm)?;
        let (grid, report) = calculator.apply(level, resistance)?;
        self.channels.insert(Channel::Resistivity, grid);
        Some(report)
    }
}
