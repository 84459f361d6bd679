use nalgebra::{DMatrix, DVector};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    pub sigma2: f64,
}

impl OlsFit {
    pub fn t_stat(&self, j: usize) -> f64 {
        self.coefficients[j] / self.std_errors[j]
    }
}

/// Ordinary least squares via the Cholesky factor of X'X.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit> {
    let (n, p) = x.shape();
    if n != y.len() {
        return Err(AnalysisError::Data(format!(
            "design has {} rows but response has {}",
            n,
            y.len()
        )));
    }
    if n <= p {
        return Err(AnalysisError::InsufficientData {
            what: "least squares fit".to_string(),
            needed: p + 1,
            got: n,
        });
    }

    let xt = x.transpose();
    let chol = (&xt * x)
        .cholesky()
        .ok_or_else(|| AnalysisError::Numerical("X'X is not positive definite".to_string()))?;
    let beta = chol.solve(&(&xt * y));
    let residuals = y - x * &beta;
    let sigma2 = residuals.norm_squared() / (n - p) as f64;
    let inv = chol.inverse();
    let std_errors = (0..p).map(|j| (sigma2 * inv[(j, j)]).sqrt()).collect();

    Ok(OlsFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        residuals: residuals.iter().copied().collect(),
        sigma2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let x = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
        let y = DVector::from_fn(5, |i, _| 2.0 + 3.0 * i as f64);
        let fit = ols(&x, &y).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[1] - 3.0).abs() < 1e-9);
        assert!(fit.sigma2 < 1e-18);
    }

    #[test]
    fn rejects_too_few_rows() {
        let x = DMatrix::from_fn(2, 2, |i, j| (i + j) as f64);
        let y = DVector::from_element(2, 1.0);
        assert!(ols(&x, &y).is_err());
    }
}
