/// Quantiles reported for request latency.
pub const LATENCY_QUANTILES: [f64; 3] = [0.50, 0.95, 0.99];

/// Quantiles reported for the auxiliary metric.
pub const AUX_QUANTILES: [f64; 2] = [0.50, 0.95];

/// Mean and nearest-rank percentiles of a sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub mean: f64,
    /// `(quantile, value)` in the order the quantiles were requested.
    pub percentiles: Vec<(f64, f64)>,
}

impl Aggregate {
    /// Value for a quantile that was passed to [`aggregate`].
    pub fn percentile(&self, q: f64) -> Option<f64> {
        self.percentiles.iter().find(|(quantile, _)| *quantile == q).map(|(_, v)| *v)
    }
}

/// Sort `values` and return the mean plus the nearest-rank value for each quantile.
///
/// An empty input yields zero for the mean and every percentile.
pub fn aggregate(values: &[f64], quantiles: &[f64]) -> Aggregate {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let mean = if sorted.is_empty() { 0.0 } else { sorted.iter().sum::<f64>() / sorted.len() as f64 };
    let percentiles = quantiles.iter().map(|&q| (q, percentile_sorted(&sorted, q))).collect();

    Aggregate { count: sorted.len(), mean, percentiles }
}

/// Index `round(q * (n - 1))` clamped to `[0, n - 1]`. Ties round half up. 0 when `n` is 0.
pub fn percentile_index(n: usize, q: f64) -> usize {
    let last = n.saturating_sub(1);
    let raw = (q * last as f64).round();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(last)
    }
}

/// Nearest-rank percentile of an ascending slice; 0 for an empty slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[percentile_index(sorted.len(), q)]
}
