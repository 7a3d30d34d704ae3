//! wpmd - typing speed monitor daemon
//!
//! Wires the `wpm-monitor` core to the outside world:
//! - keystroke capture from the terminal or standard input
//! - a periodic driver that samples and classifies the rate
//! - a data log with anomalies highlighted
//! - an SVG chart and JSON summary written at shutdown

#![deny(unsafe_code)]

pub mod chart;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod recorder;

pub use chart::{SessionChart, SessionSummary};
pub use config::{DaemonConfig, DriverConfig, InputMode, LoggingConfig, OutputConfig};
pub use driver::{Driver, SessionReport};
pub use error::{DaemonError, DaemonResult};
pub use input::{InputHandle, KeyAction, StopReason};
pub use recorder::{DataLogger, DataPoint};
