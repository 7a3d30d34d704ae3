//! wpmd - Typing speed monitor
//!
//! Counts completed words, samples the words-per-minute rate on a fixed
//! interval, flags anomalous samples, and writes a data log plus an
//! end-of-session chart.

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wpm_daemon::{input, DaemonConfig, DaemonResult, Driver, InputMode, StopReason};
use wpm_monitor::{RateEstimator, SharedRateEstimator};

/// wpmd CLI
#[derive(Parser)]
#[command(name = "wpmd")]
#[command(about = "Monitor typing speed and detect anomalies", long_about = None)]
#[command(version)]
struct Cli {
    /// Anomaly detection algorithm
    #[arg(
        short,
        long,
        env = "WPM_ALGORITHM",
        value_parser = ["zscore", "iqr", "dbscan"]
    )]
    algorithm: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "WPM_CONFIG")]
    config: Option<String>,

    /// Read words from standard input instead of the terminal
    #[arg(long)]
    stdin: bool,

    /// Seconds between samples
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level
    #[arg(long, env = "WPM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "WPM_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(algorithm) = cli.algorithm {
        config.monitor.strategy = algorithm;
    }
    if cli.stdin {
        config.driver.input = InputMode::Stdin;
    }
    if let Some(interval) = cli.interval {
        config.driver.log_interval_secs = interval;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    config.validate()?;

    // Print startup banner
    println!(
        r#"
 __      ___ __  _ __ ___
 \ \ /\ / / '_ \| '_ ` _ \
  \ V  V /| |_) | | | | | |
   \_/\_/ | .__/|_| |_| |_|
          |_|

  Typing Speed Monitor
  Version: {}
  Algorithm: {}
  Window: {}s, sampling every {}s
  Input: {}
  Data log: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.monitor.strategy,
        config.monitor.window_size_secs,
        config.driver.log_interval_secs,
        match config.driver.input {
            InputMode::Terminal => "terminal (space = word, Esc = stop)",
            InputMode::Stdin => "stdin (space = word, EOF = stop)",
        },
        config.output.log_path().display()
    );

    let estimator = SharedRateEstimator::new(RateEstimator::new(config.monitor.window_size_secs));
    let driver = Driver::new(config.clone(), estimator.clone())?;

    let (stop_tx, stop_rx) = mpsc::unbounded_channel();
    let input = input::spawn(config.driver.input, estimator, stop_tx.clone())?;

    // Ctrl-C outside raw mode
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(StopReason::Interrupted);
        }
    });

    let result = driver.run(stop_rx).await;
    input.shutdown().await;

    match &result {
        Ok(report) => {
            info!(reason = %report.stop_reason, "Session finished");
            println!(
                "\nMonitoring Stopped. Plot saved to {}",
                report.plot_path.display()
            );
        }
        Err(e) => {
            warn!(error = %e, "Session ended with an error");
            if config.output.plot_path.exists() {
                println!(
                    "\nMonitoring Stopped. Plot saved to {}",
                    config.output.plot_path.display()
                );
            }
        }
    }

    result.map(|_| ())
}
