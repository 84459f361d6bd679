use serde::Serialize;

use crate::describe::std_dev;
use crate::error::{AnalysisError, Result};
use crate::evaluate::HoldoutPredictions;

/// Two-tailed 99% standard normal critical value.
pub const Z_99: f64 = 2.575;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalRow {
    pub row: usize,
    pub actual: f64,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IntervalRow {
    pub fn covers_actual(&self) -> bool {
        self.actual >= self.lower && self.actual <= self.upper
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NextStep {
    pub row: usize,
    pub predicted: f64,
    pub actual: f64,
    pub lower: f64,
    pub upper: f64,
    pub percent_deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub model_id: usize,
    pub critical_value: f64,
    pub residual_sd: f64,
    pub intervals: Vec<IntervalRow>,
    /// Share of holdout actuals inside their interval.
    pub coverage: f64,
    pub next_step: NextStep,
}

/// `(predicted - actual) / actual * 100`: positive when over-predicting a
/// positive actual.
pub fn percent_deviation(predicted: f64, actual: f64) -> Result<f64> {
    if actual == 0.0 || !actual.is_finite() {
        return Err(AnalysisError::InvalidParameter(format!(
            "percent deviation undefined for actual value {}",
            actual
        )));
    }
    Ok((predicted - actual) / actual * 100.0)
}

/// Residuals are `actual - predicted`.
pub fn residuals(predicted: &[f64], actual: &[f64]) -> Vec<f64> {
    actual.iter().zip(predicted).map(|(a, p)| a - p).collect()
}

/// Symmetric `pred ± critical·sd` band around every holdout prediction.
pub fn prediction_intervals(
    holdout: &HoldoutPredictions,
    critical_value: f64,
) -> Result<(f64, Vec<IntervalRow>)> {
    let n = holdout.predicted.len();
    if holdout.actual.len() != n || holdout.rows.len() != n {
        return Err(AnalysisError::Data(
            "holdout rows, predictions and actuals differ in length".to_string(),
        ));
    }
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            what: "residual standard deviation".to_string(),
            needed: 2,
            got: n,
        });
    }
    if !(critical_value >= 0.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "critical value must be non-negative, got {}",
            critical_value
        )));
    }
    let sd = std_dev(&residuals(&holdout.predicted, &holdout.actual));
    let half = critical_value * sd;
    let rows = (0..n)
        .map(|i| IntervalRow {
            row: holdout.rows[i],
            actual: holdout.actual[i],
            predicted: holdout.predicted[i],
            lower: holdout.predicted[i] - half,
            upper: holdout.predicted[i] + half,
        })
        .collect();
    Ok((sd, rows))
}

pub fn forecast(
    model_id: usize,
    holdout: &HoldoutPredictions,
    critical_value: f64,
) -> Result<Forecast> {
    let (residual_sd, intervals) = prediction_intervals(holdout, critical_value)?;
    // Holdout rows are chronological, so the last one is the most recent day.
    let last = *intervals
        .iter()
        .max_by_key(|r| r.row)
        .ok_or_else(|| AnalysisError::Data("empty holdout".to_string()))?;
    let next_step = NextStep {
        row: last.row,
        predicted: last.predicted,
        actual: last.actual,
        lower: last.lower,
        upper: last.upper,
        percent_deviation: percent_deviation(last.predicted, last.actual)?,
    };
    let coverage =
        intervals.iter().filter(|r| r.covers_actual()).count() as f64 / intervals.len() as f64;

    tracing::info!(
        model = model_id,
        residual_sd,
        coverage,
        predicted = next_step.predicted,
        "Forecast computed"
    );
    Ok(Forecast {
        model_id,
        critical_value,
        residual_sd,
        intervals,
        coverage,
        next_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_deviation_rejects_zero_actual() {
        assert!(percent_deviation(1.0, 0.0).is_err());
    }

    #[test]
    fn zero_critical_value_collapses_interval() {
        let holdout = HoldoutPredictions {
            rows: vec![3, 9],
            predicted: vec![1.0, 2.0],
            actual: vec![1.5, 1.5],
        };
        let (_, rows) = prediction_intervals(&holdout, 0.0).unwrap();
        assert!(rows.iter().all(|r| r.lower == r.predicted && r.upper == r.predicted));
    }
}
