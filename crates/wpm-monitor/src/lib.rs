//! # wpm-monitor
//!
//! Typing speed estimation and anomaly classification.
//!
//! ## Architecture
//!
//! ```text
//!   key capture ──record_event(ms)──► ┌────────────────────┐
//!                                     │ SharedRateEstimator│  ← mutex-guarded window
//!                                     └─────────┬──────────┘
//!                                               │ current_rate()   (every tick)
//!                                               ▼
//!                                     ┌────────────────────┐
//!                                     │   AnomalyEngine    │  ← append-only history
//!                                     │ zscore | iqr | dbscan
//!                                     └─────────┬──────────┘
//!                                               │ Classification
//!                                               ▼
//!                                      data log / chart
//! ```
//!
//! ## Invariants
//!
//! - The window never holds a timestamp older than `window_size_secs`
//!   relative to the clock at the last mutation, except a sole entry.
//! - The history only grows; samples are never removed or reordered.
//! - The strategy is fixed at construction. An unrecognized name fails on
//!   every `classify`, after the sample has been appended.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wpm_monitor::{AnomalyEngine, MonitorConfig, RateEstimator, SharedRateEstimator};
//!
//! let config = MonitorConfig::default();
//! let estimator = SharedRateEstimator::new(RateEstimator::new(config.window_size_secs));
//! let mut engine = AnomalyEngine::from_config(&config);
//!
//! estimator.record_word();
//! estimator.record_word();
//!
//! let wpm = estimator.current_rate();
//! let anomalous = engine.classify(wpm as f64).unwrap();
//! println!("{} wpm, anomaly: {}", wpm, anomalous);
//! ```

#![deny(unsafe_code)]

pub mod anomaly;
pub mod clock;
pub mod config;
pub mod error;
pub mod rate;
pub mod stats;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use anomaly::{
    AnomalyEngine, Classification, ClusterLabel, DbscanModel, IqrModel, OutlierModel, Strategy,
    StrategySelection, Verdict, ZScoreModel,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DetectionParams, MonitorConfig, DEFAULT_DBSCAN_EPSILON, DEFAULT_DBSCAN_MIN_SAMPLES,
    DEFAULT_IQR_MULTIPLIER, DEFAULT_STRATEGY, DEFAULT_WINDOW_SIZE_SECS, DEFAULT_ZSCORE_THRESHOLD,
};
pub use error::{MonitorError, MonitorResult};
pub use rate::{RateEstimator, SharedRateEstimator};
