use serde::Serialize;

use crate::data::Dataset;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub column: String,
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub column: String,
    /// `counts.len() + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample variance with the n-1 denominator.
pub fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

pub fn std_dev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Moment-based skewness and excess kurtosis (population moments).
pub fn shape_moments(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    if xs.len() < 3 {
        return (f64::NAN, f64::NAN);
    }
    let m = mean(xs);
    let m2 = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return (0.0, 0.0);
    }
    let m3 = xs.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    let m4 = xs.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n;
    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

/// Linear-interpolation quantile on sorted data (R type 7).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

pub fn summarize(column: &str, xs: &[f64]) -> Summary {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (skewness, excess_kurtosis) = shape_moments(xs);
    Summary {
        column: column.to_string(),
        n: xs.len(),
        mean: mean(xs),
        sd: std_dev(xs),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
        skewness,
        excess_kurtosis,
    }
}

/// Equal-width histogram with Sturges' bin count, `ceil(log2 n) + 1`.
pub fn histogram(column: &str, xs: &[f64]) -> Histogram {
    if xs.is_empty() {
        return Histogram {
            column: column.to_string(),
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }
    let bins = ((xs.len() as f64).log2().ceil() as usize + 1).max(1);
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let edges = (0..=bins).map(|i| lo + i as f64 * width).collect();
    let mut counts = vec![0usize; bins];
    for &x in xs {
        let idx = (((x - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram {
        column: column.to_string(),
        edges,
        counts,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Descriptives {
    pub rows: usize,
    pub summaries: Vec<Summary>,
    pub histograms: Vec<Histogram>,
}

pub fn describe(dataset: &Dataset) -> Descriptives {
    let mut summaries = Vec::with_capacity(dataset.n_cols());
    let mut histograms = Vec::with_capacity(dataset.n_cols());
    for (name, xs) in dataset.iter_columns() {
        summaries.push(summarize(name, xs));
        histograms.push(histogram(name, xs));
    }
    Descriptives {
        rows: dataset.n_rows(),
        summaries,
        histograms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_match_type7() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile_sorted(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn histogram_counts_every_value() {
        let xs: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let h = histogram("x", &xs);
        assert_eq!(h.counts.len(), 8);
        assert_eq!(h.edges.len(), 9);
        assert_eq!(h.total(), 100);
    }

    #[test]
    fn constant_column_falls_into_one_bin() {
        let h = histogram("c", &[3.0; 10]);
        assert_eq!(h.counts[0], 10);
    }
}
