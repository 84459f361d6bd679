use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::data::{Dataset, RESPONSE};
use crate::error::{AnalysisError, Result};

/// Ranks starting at 1, ties receive their average rank.
pub fn rank_average(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].partial_cmp(&xs[b]).unwrap_or(std::cmp::Ordering::Equal));
    let mut ranks = vec![0.0; xs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && xs[order[j + 1]] == xs[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(AnalysisError::Data(format!(
            "spearman: lengths differ ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 3 {
        return Err(AnalysisError::InsufficientData {
            what: "rank correlation".to_string(),
            needed: 3,
            got: x.len(),
        });
    }
    Ok(pearson(&rank_average(x), &rank_average(y)))
}

/// Two-sided p-value for H0: rho = 0 from `t = r·sqrt((n-2)/(1-r²))`.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if r.is_nan() || n < 3 {
        return f64::NAN;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub rho: Vec<Vec<f64>>,
    pub p_values: Vec<Vec<f64>>,
    /// Variables whose correlation with the response is not significant.
    pub independent_of_response: Vec<String>,
}

impl CorrelationMatrix {
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

pub fn spearman_matrix(dataset: &Dataset, alpha: f64) -> Result<CorrelationMatrix> {
    let n = dataset.n_rows();
    let ranked: Vec<(String, Vec<f64>)> = dataset
        .iter_columns()
        .map(|(name, xs)| (name.to_string(), rank_average(xs)))
        .collect();
    let k = ranked.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData {
            what: "rank correlation".to_string(),
            needed: 3,
            got: n,
        });
    }

    let mut rho = vec![vec![1.0; k]; k];
    let mut p_values = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let r = pearson(&ranked[i].1, &ranked[j].1);
            let p = correlation_p_value(r, n);
            rho[i][j] = r;
            rho[j][i] = r;
            p_values[i][j] = p;
            p_values[j][i] = p;
        }
    }

    let columns: Vec<String> = ranked.into_iter().map(|(name, _)| name).collect();
    let independent_of_response = match columns.iter().position(|c| c == RESPONSE) {
        Some(r) => columns
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != r && !(p_values[r][j] < alpha))
            .map(|(_, name)| name.clone())
            .collect(),
        None => Vec::new(),
    };

    Ok(CorrelationMatrix {
        columns,
        rho,
        p_values,
        independent_of_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_get_average_rank() {
        let r = rank_average(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(r, vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn p_value_of_zero_correlation_is_one() {
        assert!((correlation_p_value(0.0, 100) - 1.0).abs() < 1e-12);
        assert_eq!(correlation_p_value(1.0, 100), 0.0);
    }
}
