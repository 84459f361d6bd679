use oil_gamlss::evaluate::{best_model, error_metrics, mae, rmse, ErrorMetrics, ModelScore};

fn score(model_id: usize, mae: f64, rmse: f64) -> ModelScore {
    ModelScore {
        model_id,
        description: format!("model {}", model_id),
        metrics: ErrorMetrics { n: 10, mae, rmse },
        aic: 0.0,
    }
}

#[test]
fn perfect_predictions_have_zero_error() {
    let a = [3.9, 4.0, 4.1];
    assert_eq!(mae(&a, &a).unwrap(), 0.0);
    assert_eq!(rmse(&a, &a).unwrap(), 0.0);
}

#[test]
fn rmse_dominates_mae() {
    let p = [1.0, 2.5, -0.3, 4.0, 7.2];
    let a = [1.4, 2.0, 0.1, 5.5, 7.0];
    let m = error_metrics(&p, &a).unwrap();
    assert!(m.mae > 0.0);
    assert!(m.rmse >= m.mae);
    assert_eq!(m.n, 5);
}

#[test]
fn empty_input_is_an_error() {
    assert!(error_metrics(&[], &[]).is_err());
}

#[test]
fn best_model_prefers_lowest_rmse() {
    let scores = vec![
        score(1, 0.010, 0.020),
        score(2, 0.008, 0.025),
        score(3, 0.012, 0.015),
    ];
    assert_eq!(best_model(&scores).unwrap().model_id, 3);
}

#[test]
fn rmse_ties_fall_to_mae_then_model_number() {
    let scores = vec![score(2, 0.011, 0.02), score(4, 0.010, 0.02)];
    assert_eq!(best_model(&scores).unwrap().model_id, 4);

    let scores = vec![score(3, 0.01, 0.02), score(1, 0.01, 0.02)];
    assert_eq!(best_model(&scores).unwrap().model_id, 1);
}
