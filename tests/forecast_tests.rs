use oil_gamlss::evaluate::HoldoutPredictions;
use oil_gamlss::forecast::{forecast, percent_deviation, prediction_intervals, Z_99};

fn holdout() -> HoldoutPredictions {
    HoldoutPredictions {
        rows: vec![4, 11, 17, 30, 42],
        predicted: vec![4.00, 4.05, 4.02, 4.10, 4.08],
        actual: vec![4.01, 4.03, 4.06, 4.09, 4.12],
    }
}

#[test]
fn intervals_bracket_every_prediction() {
    let (sd, rows) = prediction_intervals(&holdout(), Z_99).unwrap();
    assert!(sd > 0.0);
    for r in &rows {
        assert!(r.lower <= r.predicted && r.predicted <= r.upper);
        assert!(((r.upper - r.predicted) - Z_99 * sd).abs() < 1e-12);
    }
}

#[test]
fn residual_sd_uses_actual_minus_predicted() {
    let h = HoldoutPredictions {
        rows: vec![0, 1],
        predicted: vec![1.0, 1.0],
        actual: vec![2.0, 0.0],
    };
    let (sd, _) = prediction_intervals(&h, 1.0).unwrap();
    assert!((sd - 2f64.sqrt()).abs() < 1e-12);
}

#[test]
fn next_step_is_the_latest_holdout_row() {
    let f = forecast(3, &holdout(), Z_99).unwrap();
    assert_eq!(f.model_id, 3);
    assert_eq!(f.next_step.row, 42);
    assert!((f.next_step.predicted - 4.08).abs() < 1e-12);
    assert!((f.next_step.actual - 4.12).abs() < 1e-12);
    assert!(f.next_step.percent_deviation < 0.0);
    assert!((0.0..=1.0).contains(&f.coverage));
}

#[test]
fn percent_deviation_sign_follows_prediction_error() {
    assert!(percent_deviation(4.2, 4.0).unwrap() > 0.0);
    assert!(percent_deviation(3.8, 4.0).unwrap() < 0.0);
    assert!((percent_deviation(4.4, 4.0).unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn single_row_holdout_is_insufficient() {
    let h = HoldoutPredictions {
        rows: vec![0],
        predicted: vec![1.0],
        actual: vec![1.0],
    };
    assert!(prediction_intervals(&h, Z_99).is_err());
}
