//! Strategy selection and classification results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

// ── Strategy ────────────────────────────────────────────────────────────

/// Outlier model used by the anomaly engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Population z-score against the full history.
    ZScore,
    /// Tukey fences from the 25th/75th percentiles.
    Iqr,
    /// Density clustering; noise points are anomalous.
    Dbscan,
}

impl Strategy {
    /// All recognized strategies.
    pub const ALL: [Strategy; 3] = [Strategy::ZScore, Strategy::Iqr, Strategy::Dbscan];

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZScore => "zscore",
            Self::Iqr => "iqr",
            Self::Dbscan => "dbscan",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers are case-sensitive.
impl FromStr for Strategy {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| MonitorError::UnknownStrategy { name: s.to_string() })
    }
}

/// What the engine was constructed with: a recognized strategy, or the raw
/// name that failed to parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategySelection {
    Known(Strategy),
    Unrecognized(String),
}

impl StrategySelection {
    /// Parse a name without failing.
    pub fn parse(name: &str) -> Self {
        match name.parse() {
            Ok(strategy) => Self::Known(strategy),
            Err(_) => Self::Unrecognized(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Known(strategy) => strategy.as_str(),
            Self::Unrecognized(name) => name,
        }
    }
}

impl From<Strategy> for StrategySelection {
    fn from(strategy: Strategy) -> Self {
        Self::Known(strategy)
    }
}

// ── Results ─────────────────────────────────────────────────────────────

/// Raw output of one outlier model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_anomaly: bool,
    /// Model-specific score, when the model got far enough to compute one.
    pub score: Option<f64>,
}

impl Verdict {
    /// Not anomalous, no score (insufficient data or degenerate input).
    pub fn normal() -> Self {
        Self {
            is_anomaly: false,
            score: None,
        }
    }

    pub fn scored(is_anomaly: bool, score: f64) -> Self {
        Self {
            is_anomaly,
            score: Some(score),
        }
    }
}

/// Outcome of classifying one sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The sample that was appended and evaluated.
    pub sample: f64,
    pub is_anomaly: bool,
    pub strategy: Strategy,
    /// History length including this sample.
    pub history_len: usize,
    /// z for zscore, fence distance in IQR units for iqr, neighbour count
    /// for dbscan.
    pub score: Option<f64>,
}
