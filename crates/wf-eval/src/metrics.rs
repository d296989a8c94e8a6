//! Error metrics comparing a forecast series against observations.
//!
//! Metrics are pure, deterministic functions. The `id` participates in
//! the error-grid cache key, so two metrics with the same id must
//! compute the same thing.
//!
//! When forecast and observation lengths differ (different output
//! cadences, clipped observation windows) the comparison runs over the
//! common prefix.

/// A pluggable error metric.
pub trait ErrorMetric: Send + Sync {
    /// Stable identity, part of the cache key.
    fn id(&self) -> &str;

    /// Error of `simulated` against `observed`. Lower is better.
    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64;
}

fn paired<'a>(simulated: &'a [f64], observed: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = simulated.len().min(observed.len());
    (&simulated[..n], &observed[..n])
}

fn rmse(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (s, o) in pairs {
        let d = s - o;
        sum += d * d;
        n += 1;
    }
    if n == 0 {
        return f64::NAN;
    }
    (sum / n as f64).sqrt()
}

fn mae(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (s, o) in pairs {
        sum += (s - o).abs();
        n += 1;
    }
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Upper-quartile threshold of a series; peak metrics compare only the
/// time steps where the observed value reaches it.
fn peak_threshold(observed: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = observed.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((sorted.len() as f64) * 0.75) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Root-mean-square error over the whole comparison window.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmseAll;

impl ErrorMetric for RmseAll {
    fn id(&self) -> &str {
        "rmse_all"
    }

    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64 {
        let (s, o) = paired(simulated, observed);
        rmse(s.iter().copied().zip(o.iter().copied()))
    }
}

/// Mean absolute error over the whole comparison window.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaeAll;

impl ErrorMetric for MaeAll {
    fn id(&self) -> &str {
        "mae_all"
    }

    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64 {
        let (s, o) = paired(simulated, observed);
        mae(s.iter().copied().zip(o.iter().copied()))
    }
}

/// RMSE restricted to observed wave-height peaks (upper quartile).
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsePeak;

impl ErrorMetric for RmsePeak {
    fn id(&self) -> &str {
        "rmse_peak"
    }

    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64 {
        let (s, o) = paired(simulated, observed);
        if o.is_empty() {
            return f64::NAN;
        }
        let threshold = peak_threshold(o);
        rmse(s.iter().copied().zip(o.iter().copied()).filter(|&(_, obs)| obs >= threshold))
    }
}

/// MAE restricted to observed wave-height peaks (upper quartile).
#[derive(Debug, Clone, Copy, Default)]
pub struct MaePeak;

impl ErrorMetric for MaePeak {
    fn id(&self) -> &str {
        "mae_peak"
    }

    fn evaluate(&self, simulated: &[f64], observed: &[f64]) -> f64 {
        let (s, o) = paired(simulated, observed);
        if o.is_empty() {
            return f64::NAN;
        }
        let threshold = peak_threshold(o);
        mae(s.iter().copied().zip(o.iter().copied()).filter(|&(_, obs)| obs >= threshold))
    }
}
