use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use log::info;
use simplelog::*;

use crate::chart_math::scope::Series;

/// Maps a level name to a filter. `None` means logging is switched off.
pub fn parse_level(level: &str) -> Result<Option<LevelFilter>, String> {
    let filter = match level.to_lowercase().as_str() {
        "off" | "none" => return Ok(None),
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        other => {
            return Err(format!(
                "loglevel must be off, trace, debug, info, warn or error, got '{}'",
                other
            ));
        }
    };
    Ok(Some(filter))
}

/// log file name stamped with the current date and time
pub fn default_log_file() -> PathBuf {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("log_{}.txt", date_and_time))
}

/// Installs a terminal logger and, when `log_file` is given, a file logger
/// next to it. Level defaults to `info`.
///
/// A logger installed earlier in the process is kept; that is not an error.
pub fn init_logger(level: Option<&str>, log_file: Option<&Path>) -> io::Result<()> {
    let filter = match level.map(parse_level).transpose() {
        Ok(parsed) => parsed.unwrap_or(Some(LevelFilter::Info)),
        Err(msg) => return Err(io::Error::new(io::ErrorKind::InvalidInput, msg)),
    };
    let Some(filter) = filter else {
        return Ok(());
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        filter,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(WriteLogger::new(filter, Config::default(), File::create(path)?));
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => info!("logger initialized at level {}", filter),
        Err(_) => {
            // someone else got there first
        }
    }
    Ok(())
}

/// Saves a calculated series as `timestamp,<column>` rows. A `null`
/// datapoint is written as an empty field.
pub fn save_series_to_csv(series: &Series, column: &str, filename: &Path) -> io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(["timestamp", column])?;
    for point in series {
        let value = point.value().map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([point.timestamp().to_string(), value])?;
    }
    writer.flush()?;
    info!("series '{}' saved to {}", column, filename.display());
    Ok(())
}
