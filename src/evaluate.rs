use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::gamlss::TrainedModel;

const TIE_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
}

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.len() != actual.len() {
        return Err(AnalysisError::Data(format!(
            "{} predictions for {} actual values",
            predicted.len(),
            actual.len()
        )));
    }
    if predicted.is_empty() {
        return Err(AnalysisError::InsufficientData {
            what: "error metrics".to_string(),
            needed: 1,
            got: 0,
        });
    }
    Ok(())
}

pub fn mae(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    Ok(predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / predicted.len() as f64)
}

pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    let mse = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / predicted.len() as f64;
    Ok(mse.sqrt())
}

pub fn error_metrics(predicted: &[f64], actual: &[f64]) -> Result<ErrorMetrics> {
    Ok(ErrorMetrics {
        n: predicted.len(),
        mae: mae(predicted, actual)?,
        rmse: rmse(predicted, actual)?,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub model_id: usize,
    pub description: String,
    pub metrics: ErrorMetrics,
    pub aic: f64,
}

/// Holdout predictions for a trained model, in holdout row order.
#[derive(Debug, Clone)]
pub struct HoldoutPredictions {
    pub rows: Vec<usize>,
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
}

pub fn holdout_predictions(
    trained: &TrainedModel,
    dataset: &crate::data::Dataset,
) -> Result<HoldoutPredictions> {
    let test = dataset.select_rows(&trained.partition.test)?;
    let predicted = trained.model.predict_mu(&test)?;
    let actual = test.response()?.to_vec();
    Ok(HoldoutPredictions {
        rows: trained.partition.test.clone(),
        predicted,
        actual,
    })
}

pub fn score_model(trained: &TrainedModel, holdout: &HoldoutPredictions) -> Result<ModelScore> {
    let metrics = error_metrics(&holdout.predicted, &holdout.actual)?;
    tracing::info!(
        model = trained.model.spec.id,
        mae = metrics.mae,
        rmse = metrics.rmse,
        "Holdout evaluation"
    );
    Ok(ModelScore {
        model_id: trained.model.spec.id,
        description: trained.model.spec.description(),
        metrics,
        aic: trained.model.aic,
    })
}

/// Lowest RMSE; near ties fall to MAE, then the lower model number.
pub fn best_model(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores.iter().reduce(|best, s| {
        let better = if (s.metrics.rmse - best.metrics.rmse).abs() > TIE_EPS {
            s.metrics.rmse < best.metrics.rmse
        } else if (s.metrics.mae - best.metrics.mae).abs() > TIE_EPS {
            s.metrics.mae < best.metrics.mae
        } else {
            s.model_id < best.model_id
        };
        if better {
            s
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(mae(&[1.0], &[1.0, 2.0]).is_err());
        assert!(rmse(&[], &[]).is_err());
    }

    #[test]
    fn known_values() {
        let m = error_metrics(&[1.0, 2.0, 3.0], &[2.0, 2.0, 5.0]).unwrap();
        assert!((m.mae - 1.0).abs() < 1e-12);
        assert!((m.rmse - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
