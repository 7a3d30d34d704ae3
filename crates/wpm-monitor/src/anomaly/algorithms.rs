//! Outlier models.
//!
//! Each model inspects the full sample history and decides whether its
//! last element is an outlier. Models hold only their parameters; the
//! history is owned by the engine.

use crate::config::DetectionParams;
use crate::stats;

use super::types::Verdict;

/// Minimum history for the z-score model.
pub const ZSCORE_MIN_SAMPLES: usize = 2;

/// Minimum history for the IQR model.
pub const IQR_MIN_SAMPLES: usize = 5;

// ── Trait ────────────────────────────────────────────────────────────────

/// Outlier model evaluated over the whole history.
pub trait OutlierModel {
    /// Classify the last element of `history` against all of `history`.
    fn evaluate(&self, history: &[f64]) -> Verdict;

    /// Name of this model (for log fields).
    fn name(&self) -> &str;
}

// ── 1. Z-score ──────────────────────────────────────────────────────────

/// Flags the last sample when its population z-score exceeds the threshold.
#[derive(Clone, Copy, Debug)]
pub struct ZScoreModel {
    /// Z-score threshold (default: 3.0).
    pub threshold: f64,
}

impl ZScoreModel {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl OutlierModel for ZScoreModel {
    fn evaluate(&self, history: &[f64]) -> Verdict {
        if history.len() < ZSCORE_MIN_SAMPLES {
            return Verdict::normal();
        }
        let (Some(&last), Some(mean), Some(std_dev)) = (
            history.last(),
            stats::mean(history),
            stats::population_std_dev(history),
        ) else {
            return Verdict::normal();
        };

        // No variation, no outlier.
        if std_dev == 0.0 {
            return Verdict::normal();
        }

        let z = (last - mean) / std_dev;
        Verdict::scored(z.abs() > self.threshold, z)
    }

    fn name(&self) -> &str {
        "zscore"
    }
}

// ── 2. Interquartile range ──────────────────────────────────────────────

/// Flags the last sample when it falls strictly outside
/// `[P25 - k*IQR, P75 + k*IQR]`.
#[derive(Clone, Copy, Debug)]
pub struct IqrModel {
    /// Fence multiplier k (default: 1.5).
    pub multiplier: f64,
}

impl IqrModel {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Lower and upper fences for `history`.
    pub fn bounds(&self, history: &[f64]) -> Option<(f64, f64)> {
        let (q1, q3) = stats::quartiles(history)?;
        let iqr = q3 - q1;
        Some((q1 - self.multiplier * iqr, q3 + self.multiplier * iqr))
    }
}

impl OutlierModel for IqrModel {
    fn evaluate(&self, history: &[f64]) -> Verdict {
        if history.len() < IQR_MIN_SAMPLES {
            return Verdict::normal();
        }
        let (Some(&last), Some((lower, upper))) = (history.last(), self.bounds(history)) else {
            return Verdict::normal();
        };

        let is_anomaly = last < lower || last > upper;
        let spread = (upper - lower).max(f64::EPSILON);
        let score = if last < lower {
            (lower - last) / spread
        } else if last > upper {
            (last - upper) / spread
        } else {
            0.0
        };
        Verdict::scored(is_anomaly, score)
    }

    fn name(&self) -> &str {
        "iqr"
    }
}

// ── 3. DBSCAN ───────────────────────────────────────────────────────────

/// Cluster assignment of a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterLabel {
    Noise,
    Cluster(usize),
}

/// Density-based clustering over one-dimensional points.
///
/// A point is core when at least `min_samples` points (itself included) lie
/// within `epsilon` of it. Clusters grow from core points; points reachable
/// from no core point are noise.
pub fn dbscan(points: &[f64], epsilon: f64, min_samples: usize) -> Vec<ClusterLabel> {
    let neighbours = |i: usize| -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|&(_, &p)| (p - points[i]).abs() <= epsilon)
            .map(|(j, _)| j)
            .collect()
    };

    let mut labels: Vec<Option<ClusterLabel>> = vec![None; points.len()];
    let mut next_cluster = 0usize;

    for i in 0..points.len() {
        if labels[i].is_some() {
            continue;
        }
        let seeds = neighbours(i);
        if seeds.len() < min_samples {
            labels[i] = Some(ClusterLabel::Noise);
            continue;
        }

        let cluster = ClusterLabel::Cluster(next_cluster);
        next_cluster += 1;
        labels[i] = Some(cluster);

        let mut queue = seeds;
        while let Some(j) = queue.pop() {
            match labels[j] {
                // Border point previously marked as noise.
                Some(ClusterLabel::Noise) => labels[j] = Some(cluster),
                Some(ClusterLabel::Cluster(_)) => {}
                None => {
                    labels[j] = Some(cluster);
                    let expansion = neighbours(j);
                    if expansion.len() >= min_samples {
                        queue.extend(expansion);
                    }
                }
            }
        }
    }

    labels
        .into_iter()
        .map(|label| label.unwrap_or(ClusterLabel::Noise))
        .collect()
}

/// Flags the last sample when DBSCAN over the whole history labels it noise.
///
/// Reclusters the full history on every call: O(N²) per evaluation.
#[derive(Clone, Copy, Debug)]
pub struct DbscanModel {
    /// Neighbourhood radius (default: 10).
    pub epsilon: f64,
    /// Core-point size and minimum history length (default: 5).
    pub min_samples: usize,
}

impl DbscanModel {
    pub fn new(epsilon: f64, min_samples: usize) -> Self {
        Self {
            epsilon,
            min_samples,
        }
    }
}

impl OutlierModel for DbscanModel {
    fn evaluate(&self, history: &[f64]) -> Verdict {
        if history.len() < self.min_samples {
            return Verdict::normal();
        }
        let Some(&last) = history.last() else {
            return Verdict::normal();
        };

        let labels = dbscan(history, self.epsilon, self.min_samples);
        let is_anomaly = labels.last() == Some(&ClusterLabel::Noise);
        let neighbour_count = history
            .iter()
            .filter(|&&p| (p - last).abs() <= self.epsilon)
            .count();
        Verdict::scored(is_anomaly, neighbour_count as f64)
    }

    fn name(&self) -> &str {
        "dbscan"
    }
}

impl From<&DetectionParams> for ZScoreModel {
    fn from(params: &DetectionParams) -> Self {
        Self::new(params.zscore_threshold)
    }
}

impl From<&DetectionParams> for IqrModel {
    fn from(params: &DetectionParams) -> Self {
        Self::new(params.iqr_multiplier)
    }
}

impl From<&DetectionParams> for DbscanModel {
    fn from(params: &DetectionParams) -> Self {
        Self::new(params.dbscan_epsilon, params.dbscan_min_samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stable_then(spike: f64) -> Vec<f64> {
        let mut history: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 60.0 } else { 61.0 }).collect();
        history.push(spike);
        history
    }

    // ── Z-score ─────────────────────────────────────────────────────

    #[test]
    fn zscore_needs_two_samples() {
        let model = ZScoreModel::new(3.0);
        assert_eq!(model.evaluate(&[]), Verdict::normal());
        assert_eq!(model.evaluate(&[500.0]), Verdict::normal());
    }

    #[test]
    fn zscore_zero_variance_is_normal() {
        let model = ZScoreModel::new(3.0);
        assert_eq!(model.evaluate(&[60.0; 10]), Verdict::normal());
    }

    #[test]
    fn zscore_short_spike_is_capped_by_sample_size() {
        // mean 89.2, population std ~55.41, z of 200 ~1.9997
        let model = ZScoreModel::new(3.0);
        let verdict = model.evaluate(&[60.0, 62.0, 61.0, 63.0, 200.0]);
        let z = verdict.score.unwrap();
        assert!((z - 1.9997).abs() < 1e-3, "z = {}", z);
        assert!(!verdict.is_anomaly);

        // Same history passes a lower threshold.
        assert!(ZScoreModel::new(1.5).evaluate(&[60.0, 62.0, 61.0, 63.0, 200.0]).is_anomaly);
    }

    #[test]
    fn zscore_small_history_literal_value() {
        // [60, 61, 62]: mean 61, std sqrt(2/3); z of 62 ~1.2247
        let verdict = ZScoreModel::new(3.0).evaluate(&[60.0, 61.0, 62.0]);
        assert!((verdict.score.unwrap() - 1.224_744_871).abs() < 1e-6);
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn zscore_flags_spike_after_stable_history() {
        let verdict = ZScoreModel::new(3.0).evaluate(&stable_then(200.0));
        assert!(verdict.is_anomaly);
        assert!(verdict.score.unwrap() > 3.0);
    }

    #[test]
    fn zscore_flags_drop_with_negative_score() {
        let verdict = ZScoreModel::new(3.0).evaluate(&stable_then(0.0));
        assert!(verdict.is_anomaly);
        assert!(verdict.score.unwrap() < -3.0);
    }

    // ── IQR ─────────────────────────────────────────────────────────

    #[test]
    fn iqr_needs_five_samples() {
        let model = IqrModel::new(1.5);
        assert_eq!(model.evaluate(&[60.0, 61.0, 62.0, 10_000.0]), Verdict::normal());
    }

    #[test]
    fn iqr_bounds_use_interpolated_quartiles() {
        // Q1 = 2, Q3 = 4, IQR = 2 -> [-1, 7]
        let (lower, upper) = IqrModel::new(1.5).bounds(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((lower + 1.0).abs() < 1e-9);
        assert!((upper - 7.0).abs() < 1e-9);
    }

    #[test]
    fn iqr_flags_value_outside_fence() {
        let verdict = IqrModel::new(1.5).evaluate(&[60.0, 61.0, 62.0, 63.0, 64.0, 200.0]);
        assert!(verdict.is_anomaly);
        assert!(verdict.score.unwrap() > 0.0);
    }

    #[test]
    fn iqr_value_on_fence_is_not_anomalous() {
        // [1,2,3,4,7]: Q1 = 2, Q3 = 4, upper fence = 7 exactly.
        let verdict = IqrModel::new(1.5).evaluate(&[1.0, 2.0, 3.0, 4.0, 7.0]);
        assert!(!verdict.is_anomaly);
        assert_eq!(verdict.score, Some(0.0));
    }

    #[test]
    fn iqr_flags_low_outlier() {
        let verdict = IqrModel::new(1.5).evaluate(&[60.0, 61.0, 62.0, 63.0, 64.0, 65.0, 5.0]);
        assert!(verdict.is_anomaly);
    }

    // ── DBSCAN ──────────────────────────────────────────────────────

    #[test]
    fn dbscan_labels_dense_group_and_noise() {
        let points = [60.0, 61.0, 62.0, 63.0, 64.0, 200.0];
        let labels = dbscan(&points, 10.0, 5);
        assert!(labels[..5].iter().all(|l| *l == ClusterLabel::Cluster(0)));
        assert_eq!(labels[5], ClusterLabel::Noise);
    }

    #[test]
    fn dbscan_finds_two_clusters() {
        let mut points: Vec<f64> = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        points.extend([100.0, 101.0, 102.0, 103.0, 104.0]);
        let labels = dbscan(&points, 5.0, 5);
        assert!(labels[..5].iter().all(|l| *l == ClusterLabel::Cluster(0)));
        assert!(labels[5..].iter().all(|l| *l == ClusterLabel::Cluster(1)));
    }

    #[test]
    fn dbscan_border_point_joins_cluster() {
        // 66 has three neighbours within 10 but is reachable from core 58.
        let points = [50.0, 52.0, 54.0, 56.0, 58.0, 66.0];
        let labels = dbscan(&points, 10.0, 5);
        assert_eq!(labels[5], ClusterLabel::Cluster(0));
    }

    #[test]
    fn dbscan_neighbourhood_is_inclusive() {
        let points = [0.0, 10.0, 20.0];
        let labels = dbscan(&points, 10.0, 3);
        // 10 has exactly three neighbours at distance <= 10.
        assert_eq!(labels, vec![ClusterLabel::Cluster(0); 3]);
    }

    #[test]
    fn dbscan_model_needs_min_samples() {
        let model = DbscanModel::new(10.0, 5);
        assert_eq!(model.evaluate(&[60.0, 61.0, 62.0, 500.0]), Verdict::normal());
    }

    #[test]
    fn dbscan_model_flags_isolated_last_sample() {
        let model = DbscanModel::new(10.0, 5);
        let verdict = model.evaluate(&[60.0, 61.0, 62.0, 63.0, 64.0, 200.0]);
        assert!(verdict.is_anomaly);
        assert_eq!(verdict.score, Some(1.0));

        let verdict = model.evaluate(&[60.0, 61.0, 62.0, 63.0, 64.0, 65.0]);
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn dbscan_sparse_history_is_all_noise() {
        let model = DbscanModel::new(10.0, 5);
        let verdict = model.evaluate(&[0.0, 50.0, 100.0, 150.0, 200.0]);
        assert!(verdict.is_anomaly);
    }

    #[test]
    fn models_build_from_params() {
        let params = DetectionParams::default();
        assert_eq!(ZScoreModel::from(&params).threshold, 3.0);
        assert_eq!(IqrModel::from(&params).multiplier, 1.5);
        let db = DbscanModel::from(&params);
        assert_eq!((db.epsilon, db.min_samples), (10.0, 5));
    }
}
