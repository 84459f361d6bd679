pub mod correlation;
pub mod normality;
pub mod ols;
pub mod stationarity;

use serde::Serialize;

use crate::data::Dataset;
use crate::error::Result;

pub use correlation::{spearman, spearman_matrix, CorrelationMatrix};
pub use normality::{shapiro_test, shapiro_wilk, ShapiroWilk};
pub use stationarity::{adf_test, AdfResult};

#[derive(Debug, Clone, Serialize)]
pub struct TestSuite {
    pub normality: Vec<ShapiroWilk>,
    pub stationarity: Vec<AdfResult>,
    pub correlation: CorrelationMatrix,
}

/// Normality and unit-root tests for every column, then the rank correlation
/// matrix. Results are reported, never branched on.
pub fn run_tests(dataset: &Dataset, alpha: f64, adf_lags: Option<usize>) -> Result<TestSuite> {
    let mut normality = Vec::with_capacity(dataset.n_cols());
    let mut stationarity = Vec::with_capacity(dataset.n_cols());
    for (name, xs) in dataset.iter_columns() {
        let sw = shapiro_test(name, xs, alpha)?;
        tracing::debug!(column = name, w = sw.w, p = sw.p_value, "Shapiro-Wilk");
        normality.push(sw);

        let adf = adf_test(name, xs, adf_lags, alpha)?;
        tracing::debug!(column = name, stat = adf.statistic, p = adf.p_value, "ADF");
        stationarity.push(adf);
    }
    let correlation = spearman_matrix(dataset, alpha)?;

    tracing::info!(
        non_normal = normality.iter().filter(|t| t.reject).count(),
        stationary = stationarity.iter().filter(|t| t.stationary).count(),
        independent = ?correlation.independent_of_response,
        "Statistical tests complete"
    );

    Ok(TestSuite {
        normality,
        stationarity,
        correlation,
    })
}
