use nalgebra::{DMatrix, DVector};

use crate::error::{AnalysisError, Result};

const JITTER_STEPS: [f64; 4] = [0.0, 1e-10, 1e-8, 1e-6];

/// Cholesky factor of a symmetric positive (semi-)definite matrix, adding a
/// growing diagonal ridge when the plain factorization fails.
fn factor(a: &DMatrix<f64>) -> Result<nalgebra::Cholesky<f64, nalgebra::Dyn>> {
    let n = a.nrows();
    let scale = (a.trace() / n.max(1) as f64).abs().max(1e-12);
    for &jitter in JITTER_STEPS.iter() {
        let mut m = a.clone();
        if jitter > 0.0 {
            for i in 0..n {
                m[(i, i)] += jitter * scale;
            }
        }
        if let Some(chol) = m.cholesky() {
            return Ok(chol);
        }
    }
    Err(AnalysisError::Numerical(format!(
        "{}x{} system is not positive definite",
        n, n
    )))
}

pub fn solve_spd(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let x = factor(a)?.solve(b);
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(AnalysisError::Numerical(
            "non-finite solution of linear system".to_string(),
        ))
    }
}

pub fn inverse_spd(a: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    Ok(factor(a)?.inverse())
}

/// `X' diag(w) X`.
pub fn weighted_gram(x: &DMatrix<f64>, w: &[f64]) -> DMatrix<f64> {
    let mut xw = x.clone();
    for (i, wi) in w.iter().enumerate() {
        xw.row_mut(i).scale_mut(*wi);
    }
    x.transpose() * xw
}

/// Trace of `(G + P)^{-1} G` restricted to the column range `cols`.
pub fn partial_trace(inv: &DMatrix<f64>, gram: &DMatrix<f64>, cols: std::ops::Range<usize>) -> f64 {
    let hat = inv * gram;
    cols.map(|j| hat[(j, j)]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        let x = solve_spd(&a, &b).unwrap();
        let r = &a * &x - &b;
        assert!(r.norm() < 1e-12);
    }

    #[test]
    fn weighted_gram_matches_dense_product() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.5, 1.0, 1.5, 1.0, -2.0]);
        let w = [2.0, 1.0, 0.5];
        let dense = x.transpose() * DMatrix::from_diagonal(&DVector::from_row_slice(&w)) * &x;
        assert!((weighted_gram(&x, &w) - dense).norm() < 1e-12);
    }
}
