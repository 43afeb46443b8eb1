use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::model::Channel;
use crate::error::{LoadError, Result};

/// Tags present in rig files that carry no per-level/per-measurement grid.
pub const IGNORED_TAGS: [&str; 2] = ["ID", "HePressure_mbar"];

// ---------------------------------------------------------------------------
// RawRecord – flat buffers straight out of the file
// ---------------------------------------------------------------------------

/// Every raw channel of one file as a flat, level-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// `M`, the first integer of each size descriptor.
    pub meas_count: usize,
    /// `L`, the second integer of each size descriptor.
    pub level_count: usize,
    /// Channel → `M × L` values in file order.
    pub buffers: BTreeMap<Channel, Vec<f64>>,
}

impl RawRecord {
    /// `(level_count, meas_count)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.level_count, self.meas_count)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and parse one record file.
pub fn load_raw(path: &Path) -> Result<RawRecord> {
    let file = File::open(path)
        .map_err(|e| LoadError::input_format(path, format!("cannot open file: {e}")))?;
    parse_raw(BufReader::new(file), path)
}

/// Parse a record document from any buffered reader.
///
/// Document layout:
///
/// ```xml
/// <LT>
///   <ID>...</ID>
///   <Level_mm size="M L">v0 v1 ... v(M*L-1)</Level_mm>
///   <Voltage_V size="M L">...</Voltage_V>
///   ...
/// </LT>
/// ```
///
/// Only direct children of the root are considered. `path` is used for
/// error messages only.
pub fn parse_raw<R: BufRead>(input: R, path: &Path) -> Result<RawRecord> {
    // Untrimmed: whitespace next to a comment or PI still separates tokens.
    let mut reader = Reader::from_reader(input);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut open: Option<OpenChannel> = None;
    let mut collector = Collector::new(path);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if depth == 1 {
                    seen_root = true;
                } else if depth == 2 {
                    open = collector.open(e)?;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    seen_root = true;
                } else if depth == 1 {
                    if let Some(channel) = collector.open(e)? {
                        collector.close(channel)?;
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let (2, Some(channel)) = (depth, open.as_mut()) {
                    let text = t
                        .unescape()
                        .map_err(|e| LoadError::input_format(path, e.to_string()))?;
                    channel.push_text(&text);
                }
            }
            Ok(Event::CData(ref c)) => {
                if let (2, Some(channel)) = (depth, open.as_mut()) {
                    let text = std::str::from_utf8(c)
                        .map_err(|e| LoadError::input_format(path, e.to_string()))?;
                    channel.push_text(text);
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(channel) = open.take() {
                        collector.close(channel)?;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(LoadError::input_format(
                    path,
                    format!("XML error at byte {}: {e}", reader.buffer_position()),
                ));
            }
        }
        buf.clear();
    }

    if !seen_root {
        return Err(LoadError::input_format(path, "document has no root element"));
    }
    if depth != 0 {
        return Err(LoadError::input_format(path, "unexpected end of document"));
    }
    collector.finish()
}

/// Parse a `"M L"` size descriptor into `(meas_count, level_count)`.
///
/// Both integers must be present and positive; anything else is rejected.
pub fn parse_size(descriptor: &str) -> Option<(usize, usize)> {
    let mut parts = descriptor.split_whitespace();
    let meas = parts.next()?.parse::<usize>().ok()?;
    let levels = parts.next()?.parse::<usize>().ok()?;
    if parts.next().is_some() || meas == 0 || levels == 0 {
        return None;
    }
    Some((meas, levels))
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// A recognized channel tag whose body is still being read.
struct OpenChannel {
    channel: Channel,
    meas: usize,
    levels: usize,
    text: String,
}

impl OpenChannel {
    /// Character data split by comments or PIs is contiguous, as in XML.
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// Accumulates finished channels and enforces one `(M, L)` per file.
struct Collector<'p> {
    path: &'p Path,
    reference: Option<(Channel, (usize, usize))>,
    buffers: BTreeMap<Channel, Vec<f64>>,
}

impl<'p> Collector<'p> {
    fn new(path: &'p Path) -> Self {
        Collector {
            path,
            reference: None,
            buffers: BTreeMap::new(),
        }
    }

    /// Classify a root child; `None` means its content is skipped.
    fn open(&mut self, e: &BytesStart<'_>) -> Result<Option<OpenChannel>> {
        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        if IGNORED_TAGS.contains(&tag.as_str()) {
            debug!("{}: skipping <{tag}>", self.path.display());
            return Ok(None);
        }
        let Some(channel) = Channel::from_tag(&tag) else {
            warn!("{}: skipping unrecognized tag <{tag}>", self.path.display());
            return Ok(None);
        };
        if self.buffers.contains_key(&channel) {
            return Err(LoadError::input_format(
                self.path,
                format!("channel {channel} appears more than once"),
            ));
        }

        let size = e
            .try_get_attribute("size")
            .map_err(|err| LoadError::input_format(self.path, format!("<{tag}>: {err}")))?
            .ok_or_else(|| {
                LoadError::input_format(self.path, format!("<{tag}> has no size attribute"))
            })?;
        let size = size
            .unescape_value()
            .map_err(|err| LoadError::input_format(self.path, format!("<{tag}>: {err}")))?;
        let (meas, levels) = parse_size(&size).ok_or_else(|| {
            LoadError::input_format(
                self.path,
                format!("<{tag}> size \"{size}\" is not two positive integers \"M L\""),
            )
        })?;

        match self.reference {
            None => self.reference = Some((channel, (meas, levels))),
            Some((first, first_dims)) if first_dims != (meas, levels) => {
                return Err(LoadError::ShapeMismatch {
                    first,
                    first_dims,
                    second: channel,
                    second_dims: (meas, levels),
                });
            }
            Some(_) => {}
        }

        Ok(Some(OpenChannel {
            channel,
            meas,
            levels,
            text: String::new(),
        }))
    }

    fn close(&mut self, open: OpenChannel) -> Result<()> {
        let expected = open.meas.checked_mul(open.levels).ok_or_else(|| {
            LoadError::input_format(
                self.path,
                format!("channel {} size overflows", open.channel),
            )
        })?;
        let tokens: Vec<&str> = open.text.split_whitespace().collect();
        if tokens.len() != expected {
            return Err(LoadError::MalformedPayload {
                channel: open.channel,
                expected,
                found: tokens.len(),
            });
        }

        let values = tokens
            .iter()
            .enumerate()
            .map(|(i, tok)| {
                tok.parse::<f64>().map_err(|_| {
                    LoadError::input_format(
                        self.path,
                        format!("channel {}[{i}]: '{tok}' is not a number", open.channel),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        // The time origin is subtracted from every stamp, so one NaN or inf
        // would poison the whole axis.
        if open.channel == Channel::TIME {
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(LoadError::input_format(
                    self.path,
                    format!(
                        "channel {}[{i}]: timestamp {} is not finite",
                        open.channel, values[i]
                    ),
                ));
            }
        }

        debug!(
            "{}: read {} ({} meas x {} levels)",
            self.path.display(),
            open.channel,
            open.meas,
            open.levels
        );
        self.buffers.insert(open.channel, values);
        Ok(())
    }

    fn finish(self) -> Result<RawRecord> {
        if let Some(missing) = Channel::RAW
            .into_iter()
            .find(|c| !self.buffers.contains_key(c))
        {
            return Err(LoadError::input_format(
                self.path,
                format!("missing channel {missing}"),
            ));
        }
        // Every channel present implies a reference was recorded.
        let Some((_, (meas_count, level_count))) = self.reference else {
            return Err(LoadError::input_format(self.path, "no channels found"));
        };
        Ok(RawRecord {
            meas_count,
            level_count,
            buffers: self.buffers,
        })
    }
}
