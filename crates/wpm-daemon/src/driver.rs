//! Periodic driver: sample the rate, classify it, record it.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info};
use wpm_monitor::{AnomalyEngine, Clock, SharedRateEstimator, SystemClock};

use crate::chart::SessionChart;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::input::StopReason;
use crate::recorder::{DataLogger, DataPoint};

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub stop_reason: StopReason,
    pub samples: usize,
    pub anomalies: usize,
    pub baseline_wpm: Option<f64>,
    pub plot_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Driver state
pub struct Driver {
    config: DaemonConfig,
    estimator: SharedRateEstimator,
    engine: AnomalyEngine,
    logger: DataLogger,
    chart: SessionChart,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("strategy", &self.engine.strategy_name())
            .field("samples", &self.chart.len())
            .finish()
    }
}

impl Driver {
    /// Create a driver stamping samples with the system clock
    pub fn new(config: DaemonConfig, estimator: SharedRateEstimator) -> DaemonResult<Self> {
        Self::with_clock(config, estimator, SystemClock)
    }

    /// Create a driver with an explicit clock for sample timestamps
    pub fn with_clock(
        config: DaemonConfig,
        estimator: SharedRateEstimator,
        clock: impl Clock + 'static,
    ) -> DaemonResult<Self> {
        let engine = AnomalyEngine::from_config(&config.monitor);
        let logger = DataLogger::from_config(&config.output)?;

        Ok(Self {
            config,
            estimator,
            engine,
            logger,
            chart: SessionChart::new(),
            clock: Box::new(clock),
        })
    }

    pub fn engine(&self) -> &AnomalyEngine {
        &self.engine
    }

    pub fn chart(&self) -> &SessionChart {
        &self.chart
    }

    /// Take one sample. A strategy error leaves the sample out of the
    /// data log and the chart.
    pub fn tick(&mut self) -> DaemonResult<DataPoint> {
        let wpm = self.estimator.current_rate();
        let is_anomaly = self.engine.classify(wpm as f64)?;

        let point = DataPoint {
            timestamp_ms: self.clock.now_ms(),
            wpm,
            is_anomaly,
        };
        self.logger.log(&point)?;
        self.chart.push(point.clone());

        info!(
            wpm = point.wpm,
            anomaly = point.is_anomaly,
            words = self.estimator.word_count(),
            "Sample recorded"
        );
        Ok(point)
    }

    /// Sample every `log_interval_secs` until a stop reason arrives or a
    /// tick fails. The chart and summary are written either way.
    pub async fn run(
        mut self,
        mut stop_rx: mpsc::UnboundedReceiver<StopReason>,
    ) -> DaemonResult<SessionReport> {
        let period = Duration::from_secs(self.config.driver.log_interval_secs);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            algorithm = %self.engine.strategy_name(),
            interval_secs = self.config.driver.log_interval_secs,
            "Monitoring started"
        );

        let outcome = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick() {
                        error!(error = %e, "Sampling failed, stopping");
                        break Err(e);
                    }
                }
                reason = stop_rx.recv() => {
                    // All senders gone means no input source is left.
                    break Ok(reason.unwrap_or(StopReason::InputClosed));
                }
            }
        };

        let stop_reason = match &outcome {
            Ok(reason) => reason.clone(),
            Err(e) => StopReason::Failed(e.to_string()),
        };
        let report = self.finish(stop_reason)?;

        match outcome {
            Ok(StopReason::Failed(msg)) => Err(DaemonError::Input(msg)),
            Ok(_) => Ok(report),
            Err(e) => Err(e),
        }
    }

    /// Write the chart and the JSON summary.
    pub fn finish(&self, stop_reason: StopReason) -> DaemonResult<SessionReport> {
        let output = &self.config.output;
        self.chart.save(&output.plot_path)?;
        self.chart
            .summary(self.engine.strategy_name(), &stop_reason.to_string())
            .save(&output.summary_path)?;

        let report = SessionReport {
            samples: self.chart.len(),
            anomalies: self.chart.anomaly_count(),
            baseline_wpm: self.chart.baseline(),
            plot_path: output.plot_path.clone(),
            summary_path: output.summary_path.clone(),
            stop_reason,
        };

        info!(
            reason = %report.stop_reason,
            samples = report.samples,
            anomalies = report.anomalies,
            baseline = ?report.baseline_wpm,
            plot = %report.plot_path.display(),
            "Monitoring stopped"
        );
        Ok(report)
    }
}
