//! Anomaly classification of rate samples.
//!
//! Every call appends the sample to an unbounded history, then evaluates
//! the newest sample against the whole history with one of three models.
//!
//! ```text
//!   sample ──► history.push(sample)
//!                 │
//!                 ├──► ZScoreModel  (population mean / std)
//!                 ├──► IqrModel     (interpolated P25 / P75 fences)
//!                 └──► DbscanModel  (1-D density clustering, noise = anomaly)
//!                         │
//!                         ▼
//!                   Classification
//! ```

pub mod algorithms;
pub mod engine;
pub mod types;

pub use algorithms::{
    dbscan, ClusterLabel, DbscanModel, IqrModel, OutlierModel, ZScoreModel, IQR_MIN_SAMPLES,
    ZSCORE_MIN_SAMPLES,
};
pub use engine::AnomalyEngine;
pub use types::{Classification, Strategy, StrategySelection, Verdict};
