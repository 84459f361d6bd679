use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::stats::ols::ols;

// Critical values of the ADF t statistic with constant and trend
// (Banerjee et al. 1993), rows by sample size, columns by probability.
const TABLE_T: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];
const TABLE_P: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];
const TABLE: [[f64; 8]; 6] = [
    [-4.38, -3.95, -3.60, -3.24, -1.14, -0.80, -0.50, -0.15],
    [-4.15, -3.80, -3.50, -3.18, -1.19, -0.87, -0.58, -0.24],
    [-4.04, -3.73, -3.45, -3.15, -1.22, -0.90, -0.62, -0.28],
    [-3.99, -3.69, -3.43, -3.13, -1.23, -0.92, -0.64, -0.31],
    [-3.98, -3.68, -3.42, -3.13, -1.24, -0.93, -0.65, -0.32],
    [-3.96, -3.66, -3.41, -3.12, -1.25, -0.94, -0.66, -0.33],
];

#[derive(Debug, Clone, Serialize)]
pub struct AdfResult {
    pub column: String,
    pub statistic: f64,
    pub lag_order: usize,
    pub p_value: f64,
    /// p-value hit the edge of the table.
    pub p_clamped: bool,
    pub stationary: bool,
}

pub fn default_lag_order(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).cbrt().trunc() as usize
}

/// Linear interpolation on ascending `xs`, clamped to the end values.
pub(crate) fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if x <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.windows(2).position(|w| x >= w[0] && x <= w[1]).unwrap_or(last - 1);
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}

/// Augmented Dickey–Fuller regression `Δy_t = a + b·y_{t-1} + c·t + Σ d_i·Δy_{t-i}`.
/// Returns the t statistic on `b`.
pub fn adf_statistic(x: &[f64], lags: usize) -> Result<f64> {
    let k = lags + 1;
    let n = x.len().saturating_sub(1);
    let rows = (n + 1).saturating_sub(k);
    let p = 3 + lags;
    if rows <= p + 1 {
        return Err(AnalysisError::InsufficientData {
            what: format!("ADF regression with {} lags", lags),
            needed: k + p + 2,
            got: x.len(),
        });
    }
    let dy: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let design = DMatrix::from_fn(rows, p, |r, c| {
        let t = r + k - 1;
        match c {
            0 => 1.0,
            1 => x[t],
            2 => (t + 1) as f64,
            j => dy[t - (j - 2)],
        }
    });
    let response = DVector::from_fn(rows, |r, _| dy[r + k - 1]);
    let fit = ols(&design, &response)?;
    Ok(fit.t_stat(1))
}

pub fn adf_p_value(statistic: f64, n_diff: usize) -> (f64, bool) {
    let n = n_diff as f64;
    let interpolated: Vec<f64> = (0..TABLE_P.len())
        .map(|j| {
            let col: Vec<f64> = TABLE.iter().map(|row| row[j]).collect();
            interpolate(&TABLE_T, &col, n)
        })
        .collect();
    let p = interpolate(&interpolated, &TABLE_P, statistic);
    let clamped = statistic <= interpolated[0] || statistic >= interpolated[TABLE_P.len() - 1];
    (p, clamped)
}

pub fn adf_test(column: &str, x: &[f64], lags: Option<usize>, alpha: f64) -> Result<AdfResult> {
    let lag_order = lags.unwrap_or_else(|| default_lag_order(x.len()));
    let statistic = adf_statistic(x, lag_order)?;
    let (p_value, p_clamped) = adf_p_value(statistic, x.len() - 1);
    Ok(AdfResult {
        column: column.to_string(),
        statistic,
        lag_order,
        p_value,
        p_clamped,
        stationary: p_value < alpha,
    })
}
