use thiserror::Error;

/// Errors from the monitoring core.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid anomaly detection algorithm: {name} (expected one of zscore, iqr, dbscan)")]
    UnknownStrategy { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for monitoring results.
pub type MonitorResult<T> = Result<T, MonitorError>;
