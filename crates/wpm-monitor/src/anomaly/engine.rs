//! The anomaly engine: append-then-classify over an unbounded history.

use tracing::{debug, warn};

use crate::config::{DetectionParams, MonitorConfig};
use crate::error::{MonitorError, MonitorResult};

use super::algorithms::{DbscanModel, IqrModel, OutlierModel, ZScoreModel};
use super::types::{Classification, Strategy, StrategySelection};

/// Classifies each incoming rate sample against every sample seen so far.
///
/// The history is append-only and never trimmed, so every strategy's
/// decision depends on the whole session. The strategy is fixed at
/// construction; an unrecognized name is accepted here and reported on
/// every call to [`classify`](Self::classify).
#[derive(Clone, Debug)]
pub struct AnomalyEngine {
    selection: StrategySelection,
    params: DetectionParams,
    history: Vec<f64>,
}

impl AnomalyEngine {
    /// Create an engine from a strategy name. Never fails.
    pub fn new(strategy: &str, params: DetectionParams) -> Self {
        let selection = StrategySelection::parse(strategy);
        if let StrategySelection::Unrecognized(name) = &selection {
            warn!(strategy = %name, "unrecognized anomaly detection algorithm");
        }
        Self {
            selection,
            params,
            history: Vec::new(),
        }
    }

    /// Create an engine for a known strategy.
    pub fn with_strategy(strategy: Strategy, params: DetectionParams) -> Self {
        Self {
            selection: strategy.into(),
            params,
            history: Vec::new(),
        }
    }

    /// Create from the monitor configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(&config.strategy, config.detection.clone())
    }

    /// Append `sample` and report whether it is anomalous.
    pub fn classify(&mut self, sample: f64) -> MonitorResult<bool> {
        self.evaluate(sample).map(|c| c.is_anomaly)
    }

    /// Append `sample` and classify it, returning the full result.
    ///
    /// The sample is recorded even when the strategy is unrecognized.
    pub fn evaluate(&mut self, sample: f64) -> MonitorResult<Classification> {
        self.history.push(sample);

        let strategy = match &self.selection {
            StrategySelection::Known(strategy) => *strategy,
            StrategySelection::Unrecognized(name) => {
                return Err(MonitorError::UnknownStrategy { name: name.clone() });
            }
        };

        let model = self.model(strategy);
        let verdict = model.evaluate(&self.history);
        debug!(
            model = model.name(),
            sample,
            history_len = self.history.len(),
            score = ?verdict.score,
            anomaly = verdict.is_anomaly,
            "sample classified"
        );

        Ok(Classification {
            sample,
            is_anomaly: verdict.is_anomaly,
            strategy,
            history_len: self.history.len(),
            score: verdict.score,
        })
    }

    /// Every sample classified so far, in arrival order.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Configured strategy name, recognized or not.
    pub fn strategy_name(&self) -> &str {
        self.selection.name()
    }

    /// The recognized strategy, if any.
    pub fn strategy(&self) -> Option<Strategy> {
        match self.selection {
            StrategySelection::Known(strategy) => Some(strategy),
            StrategySelection::Unrecognized(_) => None,
        }
    }

    fn model(&self, strategy: Strategy) -> Box<dyn OutlierModel> {
        match strategy {
            Strategy::ZScore => Box::new(ZScoreModel::from(&self.params)),
            Strategy::Iqr => Box::new(IqrModel::from(&self.params)),
            Strategy::Dbscan => Box::new(DbscanModel::from(&self.params)),
        }
    }
}
