//! Shared command-line flags
//!
//! Every coursekit binary embeds [`LogArgs`] with `#[command(flatten)]` so the
//! logging surface is uniform across tools.

use anyhow::Result;
use clap::Args;
use log::LevelFilter;
use std::path::PathBuf;

use crate::logging::{self, LogConfig, LogDestination, LogFormat};

/// Logging flags shared by all binaries
#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,
}

impl LogArgs {
    /// Validate flag combinations
    pub fn validate(&self) -> Result<()> {
        let log_flags_count = [self.verbose, self.quiet, self.debug]
            .iter()
            .filter(|&&flag| flag)
            .count();

        if log_flags_count > 1 {
            return Err(anyhow::anyhow!(
                "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
            ));
        }

        if self.log_file_level.is_some() && self.log_file.is_none() {
            return Err(anyhow::anyhow!(
                "--log-file-level requires --log-file"
            ));
        }

        Ok(())
    }

    /// Console log level implied by the flags
    pub fn console_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Trace
        } else if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Info
        }
    }

    /// Build the logging configuration from the flags
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let format: LogFormat = self
            .log_format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        let file_level = match &self.log_file_level {
            Some(level) => Some(logging::parse_log_level(level)?),
            None => self.log_file.as_ref().map(|_| LevelFilter::Info),
        };

        let destination = match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Console,
        };

        Ok(LogConfig {
            console_level: self.console_level(),
            file_level,
            format,
            destination,
        })
    }

    /// Validate the flags and install the global logger
    pub fn init(&self) -> Result<()> {
        self.validate()?;
        logging::init_logger(self.to_log_config()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LogArgs {
        LogArgs {
            log_format: "text".to_string(),
            ..LogArgs::default()
        }
    }

    #[test]
    fn test_conflicting_level_flags_rejected() {
        let mut a = args();
        a.verbose = true;
        a.quiet = true;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_console_level_mapping() {
        let mut a = args();
        assert_eq!(a.console_level(), LevelFilter::Info);
        a.verbose = true;
        assert_eq!(a.console_level(), LevelFilter::Debug);
        a.verbose = false;
        a.quiet = true;
        assert_eq!(a.console_level(), LevelFilter::Error);
        a.quiet = false;
        a.debug = true;
        assert_eq!(a.console_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_file_level_requires_file() {
        let mut a = args();
        a.log_file_level = Some("debug".to_string());
        assert!(a.validate().is_err());
        a.log_file = Some(PathBuf::from("run.log"));
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_log_config_destination() {
        let mut a = args();
        let config = a.to_log_config().unwrap();
        assert_eq!(config.destination, LogDestination::Console);

        a.log_file = Some(PathBuf::from("run.log"));
        let config = a.to_log_config().unwrap();
        assert_eq!(
            config.destination,
            LogDestination::Both(PathBuf::from("run.log"))
        );
        assert_eq!(config.file_level, Some(LevelFilter::Info));
    }
}
