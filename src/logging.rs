// Logging module for coursekit
// Provides structured logging with timestamp formatting and multiple output formats
//
// Every binary initialises this once from its command-line flags:
// - Output formats: Text and JSON lines
// - Destinations: Console, File, or Both
// - Independent log levels for console and file output

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// JSON log entry structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

/// Custom logger implementation behind the `log` facade
pub struct CourseLogger {
    config: LogConfig,
}

impl CourseLogger {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    fn format_timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn format_message(&self, level: Level, message: &str) -> String {
        let timestamp = Self::format_timestamp();
        let level_name = level.to_string().to_uppercase();
        match self.config.format {
            LogFormat::Text => format!("{} [{}] {}", timestamp, level_name, message),
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp: timestamp.clone(),
                    level: level_name.clone(),
                    message: message.to_string(),
                };
                serde_json::to_string(&entry)
                    .unwrap_or_else(|_| format!("{} [{}] {}", timestamp, level_name, message))
            }
        }
    }

    fn should_log_to_console(&self, level: Level) -> bool {
        level <= self.config.console_level
    }

    fn should_log_to_file(&self, level: Level) -> bool {
        match self.config.file_level {
            Some(file_level) => level <= file_level,
            None => false,
        }
    }

    fn write_to_file(&self, formatted_message: &str, file_path: &PathBuf) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .and_then(|mut file| writeln!(file, "{}", formatted_message));
        if let Err(e) = result {
            eprintln!("File logging error ({}): {}", file_path.display(), e);
        }
    }
}

impl log::Log for CourseLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.should_log_to_console(metadata.level()) || self.should_log_to_file(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let formatted_message = self.format_message(level, &record.args().to_string());

        match &self.config.destination {
            LogDestination::Console => {
                if self.should_log_to_console(level) {
                    let _ = writeln!(io::stderr(), "{}", formatted_message);
                }
            }
            LogDestination::File(path) => {
                if self.should_log_to_file(level) {
                    self.write_to_file(&formatted_message, path);
                }
            }
            LogDestination::Both(path) => {
                if self.should_log_to_console(level) {
                    let _ = writeln!(io::stderr(), "{}", formatted_message);
                }
                if self.should_log_to_file(level) {
                    self.write_to_file(&formatted_message, path);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = match (&config.file_level, config.console_level) {
        (Some(file_level), console_level) if *file_level > console_level => *file_level,
        (_, console_level) => console_level,
    };

    log::set_boxed_logger(Box::new(CourseLogger::new(config)))
        .context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
