use statrs::distribution::{ContinuousCDF, Normal};

use oil_gamlss::family::FamilyKind;
use oil_gamlss::gamlss::{fit_family, select_family};

fn normal_sample(n: usize, mu: f64, sigma: f64) -> Vec<f64> {
    let z = Normal::new(0.0, 1.0).unwrap();
    (1..=n)
        .map(|i| mu + sigma * z.inverse_cdf((i as f64 - 0.5) / n as f64))
        .collect()
}

#[test]
fn power_exponential_recovers_location_and_scale() {
    let y = normal_sample(400, 3.0, 0.5);
    let fit = fit_family(FamilyKind::Pe, &y).unwrap();
    assert!((fit.param("mu").unwrap() - 3.0).abs() < 0.02);
    assert!((fit.param("sigma").unwrap() - 0.5).abs() < 0.05);
    assert_eq!(fit.df, 3);
}

#[test]
fn shash_recovers_location_of_normal_sample() {
    let y = normal_sample(400, -1.0, 2.0);
    let fit = fit_family(FamilyKind::Shash, &y).unwrap();
    assert!((fit.param("mu").unwrap() + 1.0).abs() < 0.2);
    assert_eq!(fit.df, 4);
}

#[test]
fn information_criteria_follow_deviance() {
    let y = normal_sample(250, 0.0, 1.0);
    let fit = fit_family(FamilyKind::JsuO, &y).unwrap();
    let df = fit.df as f64;
    assert!((fit.aic - (fit.global_deviance + 2.0 * df)).abs() < 1e-9);
    assert!((fit.sbc - (fit.global_deviance + (250f64).ln() * df)).abs() < 1e-9);
}

#[test]
fn selection_reports_every_candidate_and_picks_lowest_aic() {
    let y: Vec<f64> = normal_sample(300, 0.0, 1.0)
        .iter()
        .map(|z| 4.0 + 0.1 * (0.7 * z).exp())
        .collect();
    let selection = select_family(&y).unwrap();
    assert_eq!(selection.fits.len(), FamilyKind::CANDIDATES.len());
    let chosen = selection.selected_fit().unwrap();
    let min_aic = selection
        .fits
        .iter()
        .map(|f| f.aic)
        .fold(f64::INFINITY, f64::min);
    assert!(chosen.aic <= min_aic + 1e-6);
}

#[test]
fn too_few_observations_is_an_error() {
    assert!(fit_family(FamilyKind::Shash, &[1.0, 2.0, 3.0]).is_err());
}
