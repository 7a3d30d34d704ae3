//! Configuration for wpmd

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wpm_monitor::MonitorConfig;

use crate::error::{DaemonError, DaemonResult};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Rate window, strategy and model parameters
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Periodic driver configuration
    #[serde(default)]
    pub driver: DriverConfig,

    /// Data log and chart locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where word-completion events come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Raw-mode terminal key events (space = word, Esc = stop)
    #[default]
    Terminal,
    /// Bytes from standard input (space = word, EOF = stop)
    Stdin,
}

/// Periodic driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Seconds between rate samples
    #[serde(default = "default_log_interval")]
    pub log_interval_secs: u64,

    /// Input source
    #[serde(default)]
    pub input: InputMode,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_interval_secs: default_log_interval(),
            input: InputMode::default(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the data log (created if missing)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Data log file name
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Chart written at shutdown
    #[serde(default = "default_plot_path")]
    pub plot_path: PathBuf,

    /// JSON session summary written at shutdown
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,

    /// Echo anomalous samples to stdout
    #[serde(default = "default_true")]
    pub echo_anomalies: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            plot_path: default_plot_path(),
            summary_path: default_summary_path(),
            echo_anomalies: true,
        }
    }
}

impl OutputConfig {
    /// Full path of the data log
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_log_interval() -> u64 {
    5
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "wpm_log.log".to_string()
}

fn default_plot_path() -> PathBuf {
    PathBuf::from("plot.svg")
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("session.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then an optional file, then `WPM__*`
    /// environment variables (`WPM__MONITOR__WINDOW_SIZE_SECS=20`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Nested keys contain underscores, so the separator is doubled
        builder = builder.add_source(
            config::Environment::with_prefix("WPM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> DaemonResult<()> {
        self.monitor.validate()?;
        if self.driver.log_interval_secs == 0 {
            return Err(DaemonError::Config(
                "driver.log_interval_secs must be positive".into(),
            ));
        }
        if self.output.log_file.trim().is_empty() {
            return Err(DaemonError::Config("output.log_file must not be empty".into()));
        }
        Ok(())
    }
}
