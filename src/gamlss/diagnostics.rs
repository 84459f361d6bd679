use serde::Serialize;
use statrs::distribution::ContinuousCDF;

use crate::describe::{mean, shape_moments, variance};
use crate::family::{std_normal, Family};
use crate::stats::correlation::pearson;

const CDF_CLAMP: f64 = 1e-12;

/// Summary of normalized quantile residuals, as printed under a GAMLSS fit.
#[derive(Debug, Clone, Serialize)]
pub struct ResidualSummary {
    pub mean: f64,
    pub variance: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub filliben: f64,
}

/// `Φ^{-1}(F(y_i | θ_i))` for each observation.
pub fn quantile_residuals(family: &dyn Family, y: &[f64], thetas: &[Vec<f64>]) -> Vec<f64> {
    let normal = std_normal();
    y.iter()
        .zip(thetas)
        .map(|(yi, theta)| {
            let u = family.cdf(*yi, theta).clamp(CDF_CLAMP, 1.0 - CDF_CLAMP);
            normal.inverse_cdf(u)
        })
        .collect()
}

/// Correlation of the ordered residuals with normal order-statistic medians.
pub fn filliben(residuals: &[f64]) -> f64 {
    let n = residuals.len();
    if n < 3 {
        return f64::NAN;
    }
    let normal = std_normal();
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let nf = n as f64;
    let last = 0.5f64.powf(1.0 / nf);
    let medians: Vec<f64> = (1..=n)
        .map(|i| {
            let u = if i == 1 {
                1.0 - last
            } else if i == n {
                last
            } else {
                (i as f64 - 0.3175) / (nf + 0.365)
            };
            normal.inverse_cdf(u)
        })
        .collect();
    pearson(&sorted, &medians)
}

pub fn summarize_residuals(residuals: &[f64]) -> ResidualSummary {
    let (skewness, excess_kurtosis) = shape_moments(residuals);
    ResidualSummary {
        mean: mean(residuals),
        variance: variance(residuals),
        skewness,
        excess_kurtosis,
        filliben: filliben(residuals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_scores_have_filliben_near_one() {
        let normal = std_normal();
        let xs: Vec<f64> = (1..=200)
            .map(|i| normal.inverse_cdf(i as f64 / 201.0))
            .collect();
        assert!(filliben(&xs) > 0.999);
    }
}
