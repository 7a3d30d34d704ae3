//! Data log: one line per sample, anomalies highlighted.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::OutputConfig;

/// A sample as recorded by the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Wall-clock time of the sample, ms since epoch
    pub timestamp_ms: i64,
    pub wpm: u64,
    pub is_anomaly: bool,
}

/// Local time for a millisecond timestamp.
pub fn local_datetime(timestamp_ms: i64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local))
}

/// Render the log line for a data point.
pub fn format_line(point: &DataPoint) -> String {
    let dt = local_datetime(point.timestamp_ms).format("%Y-%m-%d %H:%M:%S%.6f");
    let message = format!("[{}] WPM: {}", dt, point.wpm);
    if point.is_anomaly {
        format!("*** {} - ANOMALY DETECTED! ***", message)
    } else {
        message
    }
}

/// Appends data points to the log file.
#[derive(Debug)]
pub struct DataLogger {
    path: PathBuf,
    echo_anomalies: bool,
}

impl DataLogger {
    /// Create the logger, creating the log directory if needed.
    pub fn new(log_dir: impl AsRef<Path>, log_file: &str) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        Ok(Self {
            path: log_dir.join(log_file),
            echo_anomalies: true,
        })
    }

    pub fn from_config(config: &OutputConfig) -> io::Result<Self> {
        let mut logger = Self::new(&config.log_dir, &config.log_file)?;
        logger.echo_anomalies = config.echo_anomalies;
        Ok(logger)
    }

    pub fn with_echo(mut self, echo_anomalies: bool) -> Self {
        self.echo_anomalies = echo_anomalies;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line; anomalies are also echoed to stdout.
    pub fn log(&self, point: &DataPoint) -> io::Result<()> {
        let line = format_line(point);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        if point.is_anomaly {
            warn!(wpm = point.wpm, "anomaly detected");
            if self.echo_anomalies {
                // Raw terminal mode needs an explicit carriage return.
                let mut stdout = io::stdout().lock();
                write!(stdout, "{}\r\n", line)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(wpm: u64, is_anomaly: bool) -> DataPoint {
        DataPoint {
            timestamp_ms: 1_700_000_000_000,
            wpm,
            is_anomaly,
        }
    }

    #[test]
    fn normal_line_format() {
        let line = format_line(&point(64, false));
        assert!(line.starts_with('['));
        assert!(line.ends_with("] WPM: 64"));
        assert!(!line.contains("ANOMALY"));
    }

    #[test]
    fn anomaly_line_is_wrapped() {
        let line = format_line(&point(220, true));
        assert!(line.starts_with("*** ["));
        assert!(line.ends_with("] WPM: 220 - ANOMALY DETECTED! ***"));
    }

    #[test]
    fn timestamp_has_microsecond_precision() {
        let line = format_line(&DataPoint {
            timestamp_ms: 1_700_000_000_123,
            wpm: 1,
            is_anomaly: false,
        });
        assert!(line.contains(".123000]"), "{}", line);
    }

    #[test]
    fn creates_directory_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let logger = DataLogger::new(&log_dir, "wpm_log.log")
            .unwrap()
            .with_echo(false);

        logger.log(&point(60, false)).unwrap();
        logger.log(&point(250, true)).unwrap();

        let contents = std::fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("WPM: 60"));
        assert!(lines[1].contains("ANOMALY DETECTED"));
    }

    #[test]
    fn reopening_keeps_previous_lines() {
        let dir = tempfile::tempdir().unwrap();
        DataLogger::new(dir.path(), "log.txt")
            .unwrap()
            .log(&point(1, false))
            .unwrap();
        let logger = DataLogger::new(dir.path(), "log.txt").unwrap();
        logger.log(&point(2, false)).unwrap();

        let contents = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
