use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};

use log::LevelFilter;

const LOG_FILE: &str = "channelcast.log";

/// Console/file logger with independently gated levels.
///
/// `CONSOLE_LOG_LEVEL` defaults to INFO; `FILE_LOG_LEVEL` defaults to OFF.
/// When file logging is enabled, records are appended to `channelcast.log`.
pub fn init() -> anyhow::Result<()> {
    let console_level = match env::var("CONSOLE_LOG_LEVEL")
        .unwrap_or_else(|_| "INFO".to_string())
        .to_uppercase()
        .as_str()
    {
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    let file_level = match env::var("FILE_LOG_LEVEL")
        .unwrap_or_else(|_| "OFF".to_string())
        .to_uppercase()
        .as_str()
    {
        "ERROR" => Some(LevelFilter::Error),
        "WARN" => Some(LevelFilter::Warn),
        "ALL" | "INFO" => Some(LevelFilter::Info),
        _ => None,
    };

    let log_file = if file_level.is_some() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)?;
        Some(Arc::new(Mutex::new(file)))
    } else {
        None
    };

    // The logger itself runs at the most verbose level either sink needs;
    // each sink filters again in the formatter.
    let max_level = std::cmp::max(console_level, file_level.unwrap_or(LevelFilter::Off));

    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .filter(None, max_level)
        .format(move |buf, record| {
            let line = format!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );

            if record.level() <= console_level {
                writeln!(buf, "{}", line)?;
            }

            if let Some(level) = file_level {
                if record.level() <= level {
                    if let Some(handle) = &log_file {
                        if let Ok(mut guard) = handle.lock() {
                            let _ = writeln!(guard, "{}", line);
                        }
                    }
                }
            }
            Ok(())
        })
        .init();

    Ok(())
}
