use statrs::distribution::ContinuousCDF;

use crate::family::{sample_median, sample_sd, std_normal, Family, Link, LN_SQRT_2PI};

/// Johnson SU, original parameterization: `nu + tau * asinh((y - mu) / sigma)`
/// is standard normal. `nu` shifts skewness, `tau` sets kurtosis.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsuOriginal;

const LINKS: [Link; 4] = [Link::Identity, Link::Log, Link::Identity, Link::Log];

impl Family for JsuOriginal {
    fn name(&self) -> &'static str {
        "JSUo"
    }

    fn links(&self) -> &'static [Link] {
        &LINKS
    }

    fn log_pdf(&self, y: f64, theta: &[f64]) -> f64 {
        let (mu, sigma, nu, tau) = (theta[0], theta[1], theta[2], theta[3]);
        let z = (y - mu) / sigma;
        let r = nu + tau * z.asinh();
        tau.ln() - sigma.ln() - 0.5 * (1.0 + z * z).ln() - LN_SQRT_2PI - 0.5 * r * r
    }

    fn cdf(&self, y: f64, theta: &[f64]) -> f64 {
        let (mu, sigma, nu, tau) = (theta[0], theta[1], theta[2], theta[3]);
        let z = (y - mu) / sigma;
        std_normal().cdf(nu + tau * z.asinh())
    }

    fn initial(&self, y: &[f64]) -> Vec<f64> {
        vec![sample_median(y), sample_sd(y), 0.0, 1.0]
    }
}
