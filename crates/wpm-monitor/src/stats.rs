//! Descriptive statistics over a sample slice.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation (denominator N).
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    let mean = mean(data)?;
    let n = data.len() as f64;
    Some((data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt())
}

/// 25th and 75th percentiles of unsorted `data`. `None` for an empty slice.
pub fn quartiles(data: &[f64]) -> Option<(f64, f64)> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some((percentile_sorted(&sorted, 25.0)?, percentile_sorted(&sorted, 75.0)?))
}

/// Percentile `p` (0..=100) of an ascending slice, with linear
/// interpolation between order statistics: rank = p/100 * (N - 1).
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(last);
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
