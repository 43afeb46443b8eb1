use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

use crate::settings::LoggingSettings;

/// Install the global logger.
///
/// `RUST_LOG`, when set, takes precedence over the configured level. Lines
/// look like `2026-10-14T09:12:03Z DEBUG lt_analysis::data::pipeline:51 : ...`.
pub fn init(settings: &LoggingSettings) {
    builder(settings).init();
}

fn builder(settings: &LoggingSettings) -> Builder {
    let default_level = if settings.enabled {
        settings.logging_level()
    } else {
        LevelFilter::Off
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}:{} : {}",
            buf.timestamp_seconds(),
            record.level(),
            record.module_path().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args()
        )
    });
    builder
}
