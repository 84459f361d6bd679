use oil_gamlss::data::{split_indices, synthetic, FeatureSet};
use oil_gamlss::evaluate::{error_metrics, holdout_predictions};
use oil_gamlss::family::FamilyKind;
use oil_gamlss::gamlss::{standard_specs, train_models, FitControl, FittedModel, PredictorForm};

#[test]
fn standard_specs_cover_both_forms_and_feature_sets() {
    let specs = standard_specs(5.0, 10);
    assert_eq!(specs.len(), 4);
    assert_eq!(specs[0].features, FeatureSet::WithLag);
    assert_eq!(specs[1].features, FeatureSet::WithoutLag);
    assert_eq!(specs[0].form, PredictorForm::Linear);
    assert!(matches!(specs[3].form, PredictorForm::Smooth { knots: 10, .. }));
    assert_eq!(
        specs.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn linear_shash_model_tracks_the_response() {
    let ds = synthetic::generate(300, 21).unwrap();
    let spec = standard_specs(5.0, 6)[0];
    let model = FittedModel::fit(spec, FamilyKind::Shash, &ds, FitControl::default()).unwrap();

    assert!(model.is_linear());
    assert_eq!(model.coefficients.len(), 1 + FeatureSet::WithLag.covariates().len());
    assert_eq!(model.coefficients[0].term, "(Intercept)");
    assert!(model.param("sigma").unwrap() > 0.0);
    assert!(model.param("tau").unwrap() > 0.0);
    assert!(model.aic > model.global_deviance);
    assert!(model.sbc > model.aic);

    let mu = model.predict_mu(&ds).unwrap();
    let metrics = error_metrics(&mu, ds.response().unwrap()).unwrap();
    assert!(metrics.rmse < 0.05, "in-sample rmse {}", metrics.rmse);
}

#[test]
fn smooth_model_reports_term_degrees_of_freedom() {
    let ds = synthetic::generate(300, 8).unwrap();
    let spec = standard_specs(5.0, 6)[3];
    let model = FittedModel::fit(spec, FamilyKind::Shash, &ds, FitControl::default()).unwrap();

    assert!(!model.is_linear());
    assert_eq!(
        model.smooth_terms.len(),
        FeatureSet::WithoutLag.covariates().len()
    );
    for term in &model.smooth_terms {
        assert!(term.lambda > 0.0);
        assert!(term.edf > 0.0);
    }
}

#[test]
fn models_are_evaluated_on_their_own_holdout() {
    let ds = synthetic::generate(250, 2).unwrap();
    let with_lag = split_indices(ds.n_rows(), 0.8, 10).unwrap();
    let without_lag = split_indices(ds.n_rows(), 0.8, 11).unwrap();
    let specs: Vec<_> = standard_specs(5.0, 6).into_iter().take(2).collect();
    let trained = train_models(
        &ds,
        &specs,
        FamilyKind::Shash,
        |features| match features {
            FeatureSet::WithLag => with_lag.clone(),
            FeatureSet::WithoutLag => without_lag.clone(),
        },
        FitControl::default(),
    )
    .unwrap();

    assert_eq!(trained[0].partition, with_lag);
    assert_eq!(trained[1].partition, without_lag);
    for t in &trained {
        assert_eq!(t.model.n_obs, 200);
        let holdout = holdout_predictions(t, &ds).unwrap();
        assert_eq!(holdout.rows, t.partition.test);
        assert_eq!(holdout.predicted.len(), 50);
    }
}
