use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AnalysisError, Result};

pub const SHAPIRO_MIN_N: usize = 3;
pub const SHAPIRO_MAX_N: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

#[derive(Debug, Clone, Serialize)]
pub struct ShapiroWilk {
    pub column: String,
    pub n: usize,
    pub w: f64,
    pub p_value: f64,
    pub reject: bool,
}

fn poly(cc: &[f64], x: f64) -> f64 {
    cc.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

/// Shapiro–Wilk W and p-value using Royston's (1995) approximation.
pub fn shapiro_wilk(xs: &[f64]) -> Result<(f64, f64)> {
    let n = xs.len();
    if !(SHAPIRO_MIN_N..=SHAPIRO_MAX_N).contains(&n) {
        return Err(AnalysisError::InvalidParameter(format!(
            "Shapiro-Wilk needs {} <= n <= {}, got {}",
            SHAPIRO_MIN_N, SHAPIRO_MAX_N, n
        )));
    }
    let mut x = xs.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let range = x[n - 1] - x[0];
    if range <= f64::EPSILON * x[0].abs().max(1.0) {
        return Err(AnalysisError::InvalidParameter(
            "Shapiro-Wilk: all values are identical".to_string(),
        ));
    }

    let a = shapiro_coefficients(n);
    let nn2 = n / 2;
    let numer: f64 = (0..nn2).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let m = x.iter().sum::<f64>() / n as f64;
    let ssq: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    let w = (numer * numer / ssq).min(1.0);

    Ok((w, shapiro_p_value(w, n)))
}

/// Coefficients a_1..a_{n/2} for the upper half of the ordered sample.
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    let nn2 = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }
    let normal = std_normal();
    let an = n as f64;
    let an25 = an + 0.25;
    let m: Vec<f64> = (1..=nn2)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; nn2];
    a[0] = a1;
    let (start, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    for i in start..nn2 {
        a[i] = -m[i] / fac;
    }
    a
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let an = n as f64;
    if n == 3 {
        let pi6 = 6.0 / std::f64::consts::PI;
        let stqr = (0.75f64).sqrt().asin();
        return (pi6 * (w.sqrt().asin() - stqr)).max(0.0);
    }
    let w1 = (1.0 - w).max(f64::MIN_POSITIVE);
    let y = w1.ln();
    let (y, m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        (-(gamma - y).ln(), poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (y, poly(&C5, xx), poly(&C6, xx).exp())
    };
    1.0 - std_normal().cdf((y - m) / s)
}

pub fn shapiro_test(column: &str, xs: &[f64], alpha: f64) -> Result<ShapiroWilk> {
    let (w, p_value) = shapiro_wilk(xs)?;
    Ok(ShapiroWilk {
        column: column.to_string(),
        n: xs.len(),
        w,
        p_value,
        reject: p_value < alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poly_evaluates_low_order_first() {
        assert!((poly(&[1.0, 2.0, 3.0], 2.0) - 17.0).abs() < 1e-12);
    }

    #[test]
    fn coefficients_are_normalized() {
        let a = shapiro_coefficients(50);
        let ss: f64 = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
        assert!((ss - 1.0).abs() < 1e-6);
        assert!(a.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rejects_constant_sample() {
        assert!(shapiro_wilk(&[1.0; 10]).is_err());
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
    }
}
