//! End-of-session chart and summary.
//!
//! The chart is rendered once, at shutdown, as a standalone SVG document:
//! normal samples as a blue line, anomalies as red dots, and a dashed green
//! baseline at the session average.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::recorder::{local_datetime, DataPoint};

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 800.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 120.0;
const MAX_X_TICKS: usize = 20;
const Y_TICKS: usize = 10;

const TITLE: &str = "Words Per Minute (WPM) Over Time";

/// Collects data points for the session chart.
#[derive(Debug, Clone, Default)]
pub struct SessionChart {
    points: Vec<DataPoint>,
}

impl SessionChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_anomaly).count()
    }

    /// Average of every recorded WPM value, anomalies included.
    pub fn baseline(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let total: f64 = self.points.iter().map(|p| p.wpm as f64).sum();
        Some(total / self.points.len() as f64)
    }

    /// Render the chart as an SVG document.
    pub fn render_svg(&self) -> String {
        SvgDocument { chart: self }.to_string()
    }

    fn write_svg(&self, svg: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plot = PlotArea::fit(&self.points);

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = WIDTH,
            h = HEIGHT
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            svg,
            r#"<text x="{}" y="40" text-anchor="middle" font-size="22">{}</text>"#,
            WIDTH / 2.0,
            TITLE
        )?;

        self.write_axes(svg, &plot)?;

        // Normal samples
        let line: Vec<String> = self
            .points
            .iter()
            .filter(|p| !p.is_anomaly)
            .map(|p| format!("{:.1},{:.1}", plot.x(p.timestamp_ms), plot.y(p.wpm as f64)))
            .collect();
        if !line.is_empty() {
            writeln!(
                svg,
                r#"<polyline class="wpm" points="{}" fill="none" stroke="blue" stroke-width="2"/>"#,
                line.join(" ")
            )?;
        }

        // Anomalies
        for p in self.points.iter().filter(|p| p.is_anomaly) {
            writeln!(
                svg,
                r#"<circle class="anomaly" cx="{:.1}" cy="{:.1}" r="5" fill="red"/>"#,
                plot.x(p.timestamp_ms),
                plot.y(p.wpm as f64)
            )?;
        }

        if let Some(baseline) = self.baseline() {
            let y = plot.y(baseline);
            writeln!(
                svg,
                r#"<line class="baseline" x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="green" stroke-width="1.5" stroke-dasharray="8,5"/>"#,
                plot.left(),
                plot.right(),
                y = y
            )?;
        }

        self.write_legend(svg)?;
        writeln!(svg, "</svg>")
    }

    fn write_axes(&self, svg: &mut fmt::Formatter<'_>, plot: &PlotArea) -> fmt::Result {
        writeln!(
            svg,
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            l = plot.left(),
            r = plot.right(),
            b = plot.bottom()
        )?;
        writeln!(
            svg,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            l = plot.left(),
            t = plot.top(),
            b = plot.bottom()
        )?;

        for i in 0..=Y_TICKS {
            let value = plot.y_max * i as f64 / Y_TICKS as f64;
            let y = plot.y(value);
            writeln!(
                svg,
                r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="12">{v:.0}</text>"##,
                l = plot.left(),
                r = plot.right(),
                y = y,
                tx = plot.left() - 8.0,
                ty = y + 4.0,
                v = value
            )?;
        }

        for ts in x_ticks(&self.points) {
            let x = plot.x(ts);
            let label = local_datetime(ts).format("%H:%M:%S");
            writeln!(
                svg,
                r#"<line x1="{x:.1}" y1="{b}" x2="{x:.1}" y2="{b2}" stroke="black"/><text class="tick" x="{x:.1}" y="{ty}" text-anchor="end" font-size="12" transform="rotate(-45 {x:.1} {ty})">{label}</text>"#,
                x = x,
                b = plot.bottom(),
                b2 = plot.bottom() + 6.0,
                ty = plot.bottom() + 20.0,
                label = label
            )?;
        }

        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">Time</text>"#,
            (plot.left() + plot.right()) / 2.0,
            HEIGHT - 20.0
        )?;
        writeln!(
            svg,
            r#"<text x="25" y="{y}" text-anchor="middle" font-size="16" transform="rotate(-90 25 {y})">WPM</text>"#,
            y = (plot.top() + plot.bottom()) / 2.0
        )
    }

    fn write_legend(&self, svg: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = WIDTH - MARGIN_RIGHT - 190.0;
        let y = MARGIN_TOP + 10.0;
        writeln!(
            svg,
            r#"<rect x="{x}" y="{y}" width="180" height="74" fill="white" stroke="gray"/>"#,
            x = x,
            y = y
        )?;
        writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="blue" stroke-width="2"/><text x="{}" y="{}" font-size="12">WPM</text>"#,
            x + 10.0,
            y + 18.0,
            x + 40.0,
            y + 18.0,
            x + 50.0,
            y + 22.0
        )?;
        writeln!(
            svg,
            r#"<circle cx="{}" cy="{}" r="5" fill="red"/><text x="{}" y="{}" font-size="12">Anomalies</text>"#,
            x + 25.0,
            y + 38.0,
            x + 50.0,
            y + 42.0
        )?;
        let label = match self.baseline() {
            Some(avg) => format!("Baseline: {:.2}", avg),
            None => "Baseline: n/a".to_string(),
        };
        writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="green" stroke-dasharray="8,5"/><text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 10.0,
            y + 58.0,
            x + 40.0,
            y + 58.0,
            x + 50.0,
            y + 62.0,
            label
        )
    }

    /// Write the SVG chart to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render_svg())
    }

    pub fn summary(&self, strategy: &str, stop_reason: &str) -> SessionSummary {
        SessionSummary {
            strategy: strategy.to_string(),
            stop_reason: stop_reason.to_string(),
            samples: self.points.len(),
            anomalies: self.anomaly_count(),
            baseline_wpm: self.baseline(),
            max_wpm: self.points.iter().map(|p| p.wpm).max(),
            points: self.points.clone(),
        }
    }
}

/// JSON record of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub strategy: String,
    pub stop_reason: String,
    pub samples: usize,
    pub anomalies: usize,
    pub baseline_wpm: Option<f64>,
    pub max_wpm: Option<u64>,
    pub points: Vec<DataPoint>,
}

impl SessionSummary {
    pub fn save(&self, path: impl AsRef<Path>) -> crate::error::DaemonResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Display adapter that streams the chart as SVG.
struct SvgDocument<'a> {
    chart: &'a SessionChart,
}

impl fmt::Display for SvgDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chart.write_svg(f)
    }
}

// ── Geometry ──────────────────────────────────────────────────────

struct PlotArea {
    t_min: i64,
    t_max: i64,
    y_max: f64,
}

impl PlotArea {
    fn fit(points: &[DataPoint]) -> Self {
        let t_min = points.iter().map(|p| p.timestamp_ms).min().unwrap_or(0);
        let t_max = points.iter().map(|p| p.timestamp_ms).max().unwrap_or(0);
        let peak = points.iter().map(|p| p.wpm).max().unwrap_or(0) as f64;
        // Headroom above the peak; never collapse to a zero-height axis.
        let y_max = ((peak * 1.1) / 10.0).ceil().max(1.0) * 10.0;
        Self { t_min, t_max, y_max }
    }

    fn left(&self) -> f64 {
        MARGIN_LEFT
    }

    fn right(&self) -> f64 {
        WIDTH - MARGIN_RIGHT
    }

    fn top(&self) -> f64 {
        MARGIN_TOP
    }

    fn bottom(&self) -> f64 {
        HEIGHT - MARGIN_BOTTOM
    }

    fn x(&self, timestamp_ms: i64) -> f64 {
        let span = (self.t_max - self.t_min) as f64;
        if span <= 0.0 {
            return (self.left() + self.right()) / 2.0;
        }
        let frac = (timestamp_ms - self.t_min) as f64 / span;
        self.left() + frac * (self.right() - self.left())
    }

    fn y(&self, value: f64) -> f64 {
        let frac = (value / self.y_max).clamp(0.0, 1.0);
        self.bottom() - frac * (self.bottom() - self.top())
    }
}

/// Timestamps to label on the x axis, at most `MAX_X_TICKS` of them.
fn x_ticks(points: &[DataPoint]) -> Vec<i64> {
    if points.is_empty() {
        return Vec::new();
    }
    let step = points.len().div_ceil(MAX_X_TICKS);
    points.iter().step_by(step).map(|p| p.timestamp_ms).collect()
}
