use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::LevelFilter;
use serde::Deserialize;

use crate::data::pipeline::{DatasetSource, IngestOptions};
use crate::data::resistivity::ResistivityCalculator;

// ---------------------------------------------------------------------------
// Settings – everything the driver needs, loadable from JSON
// ---------------------------------------------------------------------------

/// Run configuration. Every field has a default, so a settings file only
/// needs the keys it changes:
///
/// ```json
/// { "data_files": ["LT01"], "lt_max_level": 380.0, "logging": { "level": "info" } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding `<name>.<extension>` record files.
    pub data_dir: PathBuf,
    /// Dataset names processed in order.
    pub data_files: Vec<String>,
    pub extension: String,
    /// Full-scale level in mm; resistivity is undefined at or above it.
    pub lt_max_level: f64,
    /// Decimation passes applied before shaping (`0` = off).
    pub decimation_passes: u32,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub enabled: bool,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/"),
            data_files: vec!["LT01".to_string(), "LT30".to_string()],
            extension: "xml".to_string(),
            lt_max_level: 400.0,
            decimation_passes: 0,
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
        }
    }
}

impl LoggingSettings {
    /// The configured level, falling back to `debug` when it does not parse.
    pub fn logging_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Debug)
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in settings file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing settings JSON")
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.calculator().is_none() {
            bail!(
                "lt_max_level must be a positive finite number, got {}",
                self.lt_max_level
            );
        }
        if self.data_files.is_empty() {
            bail!("no datasets to process");
        }
        if self.logging.level.parse::<LevelFilter>().is_err() {
            bail!("unknown logging level '{}'", self.logging.level);
        }
        Ok(())
    }

    pub fn calculator(&self) -> Option<ResistivityCalculator> {
        ResistivityCalculator::new(self.lt_max_level)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            decimation_passes: self.decimation_passes,
        }
    }

    /// Sources for every configured dataset, in order.
    pub fn sources(&self) -> Vec<DatasetSource> {
        self.data_files
            .iter()
            .map(|name| DatasetSource::locate(&self.data_dir, name, &self.extension))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_rig_setup() {
        let s = Settings::default();
        assert_eq!(s.lt_max_level, 400.0);
        assert_eq!(s.data_files, vec!["LT01", "LT30"]);
        assert_eq!(s.decimation_passes, 0);
        assert!(s.logging.enabled);
        s.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let s = Settings::from_json(
            r#"{ "data_files": ["LT05"], "logging": { "level": "info" } }"#,
        )
        .unwrap();
        assert_eq!(s.data_files, vec!["LT05"]);
        assert_eq!(s.logging.level, "info");
        assert!(s.logging.enabled);
        assert_eq!(s.extension, "xml");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_json(r#"{ "lt_max_levle": 300 }"#).is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut s = Settings {
            lt_max_level: 0.0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());

        s.lt_max_level = 400.0;
        s.data_files.clear();
        assert!(s.validate().is_err());

        s.data_files.push("LT01".into());
        s.logging.level = "loud".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn logging_level_parses_case_insensitively() {
        let mut logging = LoggingSettings {
            enabled: true,
            level: "INFO".into(),
        };
        assert_eq!(logging.logging_level(), LevelFilter::Info);
        logging.level = "chatty".into();
        assert_eq!(logging.logging_level(), LevelFilter::Debug);
    }

    #[test]
    fn sources_follow_the_file_convention() {
        let s = Settings {
            data_dir: PathBuf::from("/rig/data"),
            ..Settings::default()
        };
        let sources = s.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].name, "LT30");
        assert_eq!(sources[1].path, PathBuf::from("/rig/data/LT30.xml"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "lt_max_level": 250.5, "decimation_passes": 3 }}"#).unwrap();
        let s = Settings::from_file(file.path()).unwrap();
        assert_eq!(s.lt_max_level, 250.5);
        assert_eq!(s.ingest_options().decimation_passes, 3);
        assert_eq!(s.calculator().unwrap().threshold(), 250.5);
    }
}
