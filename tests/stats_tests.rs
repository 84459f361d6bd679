use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::{ContinuousCDF, Normal};

use oil_gamlss::data::Dataset;
use oil_gamlss::stats::{adf_test, run_tests, shapiro_wilk, spearman, spearman_matrix};

fn normal_scores(n: usize) -> Vec<f64> {
    let z = Normal::new(0.0, 1.0).unwrap();
    (1..=n)
        .map(|i| z.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect()
}

fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let z = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| z.sample(&mut rng)).collect()
}

#[test]
fn shapiro_wilk_accepts_normal_scores() {
    let (w, p) = shapiro_wilk(&normal_scores(200)).unwrap();
    assert!(w > 0.99);
    assert!(p > 0.5);
}

#[test]
fn shapiro_wilk_rejects_skewed_sample() {
    let skewed: Vec<f64> = normal_scores(200).iter().map(|z| (1.5 * z).exp()).collect();
    let (w, p) = shapiro_wilk(&skewed).unwrap();
    assert!(w < 0.9);
    assert!(p < 0.001);
}

#[test]
fn shapiro_wilk_needs_three_values() {
    assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
}

#[test]
fn adf_separates_white_noise_from_random_walk() {
    let noise = white_noise(500, 42);
    let walk: Vec<f64> = noise
        .iter()
        .scan(0.0, |acc, e| {
            *acc += e;
            Some(*acc)
        })
        .collect();

    let stationary = adf_test("noise", &noise, None, 0.05).unwrap();
    let unit_root = adf_test("walk", &walk, None, 0.05).unwrap();
    assert_eq!(stationary.lag_order, 7);
    assert!(stationary.stationary);
    assert!(stationary.p_value <= 0.05);
    assert!(unit_root.statistic > stationary.statistic);
}

#[test]
fn spearman_is_one_for_monotone_data() {
    let x: Vec<f64> = (1..=40).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v.powi(3) - 5.0).collect();
    let rho = spearman(&x, &y).unwrap();
    assert!((rho - 1.0).abs() < 1e-12);

    let rev: Vec<f64> = x.iter().map(|v| -v.exp()).collect();
    assert!((spearman(&x, &rev).unwrap() + 1.0).abs() < 1e-12);
}

#[test]
fn spearman_matrix_flags_unrelated_column() {
    let n = 300;
    let trend: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
    let noise = white_noise(n, 5);
    let related: Vec<f64> = trend.iter().zip(&noise).map(|(t, e)| t + 0.1 * e).collect();
    let unrelated = white_noise(n, 77);
    let ds = Dataset::new(
        vec![
            "OILPRICE".to_string(),
            "near".to_string(),
            "far".to_string(),
        ],
        vec![trend, related, unrelated],
    )
    .unwrap();

    let m = spearman_matrix(&ds, 0.001).unwrap();
    let r = m.index_of("OILPRICE").unwrap();
    let near = m.index_of("near").unwrap();
    assert!(m.rho[r][near] > 0.9);
    assert!(m.p_values[r][near] < 1e-6);
    assert_eq!(m.rho[near][r], m.rho[r][near]);
    assert!(!m.independent_of_response.contains(&"near".to_string()));
}

#[test]
fn run_tests_covers_every_column() {
    let ds = oil_gamlss::data::synthetic::generate(200, 3).unwrap();
    let suite = run_tests(&ds, 0.05, None).unwrap();
    assert_eq!(suite.normality.len(), ds.n_cols());
    assert_eq!(suite.stationarity.len(), ds.n_cols());
    assert_eq!(suite.correlation.columns.len(), ds.n_cols());
    assert!(suite
        .normality
        .iter()
        .all(|t| (0.0..=1.0).contains(&t.p_value)));
}
