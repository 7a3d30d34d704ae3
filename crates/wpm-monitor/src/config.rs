//! Immutable configuration for the rate estimator and the anomaly engine.
//!
//! All values are fixed at startup. Components receive the parts they need
//! at construction and never read ambient global state.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Default trailing window for WPM calculation, in seconds.
pub const DEFAULT_WINDOW_SIZE_SECS: u64 = 15;

/// Default z-score threshold.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// Default IQR fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Default DBSCAN neighbourhood radius.
pub const DEFAULT_DBSCAN_EPSILON: f64 = 10.0;

/// Default DBSCAN minimum samples (also the minimum history length).
pub const DEFAULT_DBSCAN_MIN_SAMPLES: usize = 5;

/// Default detection strategy name.
pub const DEFAULT_STRATEGY: &str = "zscore";

/// Parameters of the three outlier models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// |z| above this value is anomalous (default: 3.0).
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,

    /// Fence multiplier k in `[P25 - k*IQR, P75 + k*IQR]` (default: 1.5).
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,

    /// DBSCAN radius (default: 10).
    #[serde(default = "default_dbscan_epsilon")]
    pub dbscan_epsilon: f64,

    /// DBSCAN core-point size, counting the point itself (default: 5).
    #[serde(default = "default_dbscan_min_samples")]
    pub dbscan_min_samples: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            dbscan_epsilon: DEFAULT_DBSCAN_EPSILON,
            dbscan_min_samples: DEFAULT_DBSCAN_MIN_SAMPLES,
        }
    }
}

/// Full configuration of the monitoring core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Trailing window for the rate estimator, in seconds.
    #[serde(default = "default_window_size_secs")]
    pub window_size_secs: u64,

    /// Detection strategy name: `zscore`, `iqr` or `dbscan`.
    ///
    /// Kept as a string so that an unrecognized name reaches the engine and
    /// fails on classification rather than at load time.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Outlier model parameters.
    #[serde(default)]
    pub detection: DetectionParams,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size_secs: DEFAULT_WINDOW_SIZE_SECS,
            strategy: DEFAULT_STRATEGY.to_string(),
            detection: DetectionParams::default(),
        }
    }
}

impl MonitorConfig {
    /// Check numeric parameters.
    ///
    /// The strategy name is deliberately not checked here.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.window_size_secs == 0 {
            return Err(MonitorError::InvalidConfig(
                "window_size_secs must be positive".into(),
            ));
        }
        let d = &self.detection;
        if !(d.zscore_threshold.is_finite() && d.zscore_threshold > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "zscore_threshold must be a positive number, got {}",
                d.zscore_threshold
            )));
        }
        if !(d.iqr_multiplier.is_finite() && d.iqr_multiplier >= 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "iqr_multiplier must be non-negative, got {}",
                d.iqr_multiplier
            )));
        }
        if !(d.dbscan_epsilon.is_finite() && d.dbscan_epsilon > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "dbscan_epsilon must be positive, got {}",
                d.dbscan_epsilon
            )));
        }
        if d.dbscan_min_samples == 0 {
            return Err(MonitorError::InvalidConfig(
                "dbscan_min_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_window_size_secs() -> u64 {
    DEFAULT_WINDOW_SIZE_SECS
}

fn default_strategy() -> String {
    DEFAULT_STRATEGY.to_string()
}

fn default_zscore_threshold() -> f64 {
    DEFAULT_ZSCORE_THRESHOLD
}

fn default_iqr_multiplier() -> f64 {
    DEFAULT_IQR_MULTIPLIER
}

fn default_dbscan_epsilon() -> f64 {
    DEFAULT_DBSCAN_EPSILON
}

fn default_dbscan_min_samples() -> usize {
    DEFAULT_DBSCAN_MIN_SAMPLES
}
