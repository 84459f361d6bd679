use nalgebra::DMatrix;
use serde::Serialize;

use crate::data::Dataset;
use crate::describe::quantile_sorted;
use crate::error::{AnalysisError, Result};
use crate::gamlss::linalg::{inverse_spd, partial_trace};

const LOG10_LAMBDA_MIN: f64 = -10.0;
const LOG10_LAMBDA_MAX: f64 = 12.0;
const LAMBDA_SEARCH_STEPS: usize = 80;

/// Penalized cubic regression spline on one covariate: columns
/// `u, u², u³, (u - κ_1)³₊ … (u - κ_K)³₊` with `u` the covariate rescaled to
/// `[0, 1]` over its training range. Only the knot columns are penalized.
#[derive(Debug, Clone, Serialize)]
pub struct SplineBasis {
    lo: f64,
    hi: f64,
    knots: Vec<f64>,
}

impl SplineBasis {
    pub fn from_data(x: &[f64], n_knots: usize) -> Result<Self> {
        if x.len() < n_knots + 4 {
            return Err(AnalysisError::InsufficientData {
                what: "spline basis".to_string(),
                needed: n_knots + 4,
                got: x.len(),
            });
        }
        let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(hi > lo) {
            return Err(AnalysisError::Data(
                "spline covariate has no spread".to_string(),
            ));
        }
        let mut u: Vec<f64> = x.iter().map(|v| (v - lo) / (hi - lo)).collect();
        u.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let knots = (1..=n_knots)
            .map(|k| quantile_sorted(&u, k as f64 / (n_knots + 1) as f64))
            .collect();
        Ok(Self { lo, hi, knots })
    }

    pub fn n_cols(&self) -> usize {
        3 + self.knots.len()
    }

    pub fn eval_into(&self, x: f64, out: &mut [f64]) {
        let u = (x - self.lo) / (self.hi - self.lo);
        out[0] = u;
        out[1] = u * u;
        out[2] = u * u * u;
        for (k, knot) in self.knots.iter().enumerate() {
            out[3 + k] = (u - knot).max(0.0).powi(3);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Term {
    Linear {
        column: String,
    },
    Smooth {
        column: String,
        basis: SplineBasis,
        lambda: f64,
        target_df: f64,
    },
}

impl Term {
    pub fn column(&self) -> &str {
        match self {
            Term::Linear { column } | Term::Smooth { column, .. } => column,
        }
    }

    pub fn n_cols(&self) -> usize {
        match self {
            Term::Linear { .. } => 1,
            Term::Smooth { basis, .. } => basis.n_cols(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PredictorForm {
    Linear,
    Smooth { df: f64, knots: usize },
}

/// Intercept plus one term per covariate; rebuilt rows for any dataset
/// carrying the same columns.
#[derive(Debug, Clone, Serialize)]
pub struct DesignTemplate {
    terms: Vec<Term>,
}

impl DesignTemplate {
    pub fn build(train: &Dataset, covariates: &[&str], form: PredictorForm) -> Result<Self> {
        let mut terms = Vec::with_capacity(covariates.len());
        for &name in covariates {
            let x = train.require(name)?;
            let term = match form {
                PredictorForm::Linear => Term::Linear {
                    column: name.to_string(),
                },
                PredictorForm::Smooth { df, knots } => {
                    let basis = SplineBasis::from_data(x, knots)?;
                    let lambda = lambda_for_df(&basis, x, df)?;
                    tracing::debug!(column = name, lambda, df, "Smoothing parameter chosen");
                    Term::Smooth {
                        column: name.to_string(),
                        basis,
                        lambda,
                        target_df: df,
                    }
                }
            };
            terms.push(term);
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn n_coef(&self) -> usize {
        1 + self.terms.iter().map(Term::n_cols).sum::<usize>()
    }

    /// Column range of each term in the design matrix.
    pub fn term_ranges(&self) -> Vec<std::ops::Range<usize>> {
        let mut start = 1;
        self.terms
            .iter()
            .map(|t| {
                let r = start..start + t.n_cols();
                start = r.end;
                r
            })
            .collect()
    }

    pub fn matrix(&self, data: &Dataset) -> Result<DMatrix<f64>> {
        let n = data.n_rows();
        let p = self.n_coef();
        let mut m = DMatrix::zeros(n, p);
        for i in 0..n {
            m[(i, 0)] = 1.0;
        }
        let mut buf = Vec::new();
        for (term, range) in self.terms.iter().zip(self.term_ranges()) {
            let x = data.require(term.column())?;
            match term {
                Term::Linear { .. } => {
                    for i in 0..n {
                        m[(i, range.start)] = x[i];
                    }
                }
                Term::Smooth { basis, .. } => {
                    buf.resize(basis.n_cols(), 0.0);
                    for i in 0..n {
                        basis.eval_into(x[i], &mut buf);
                        for (j, v) in buf.iter().enumerate() {
                            m[(i, range.start + j)] = *v;
                        }
                    }
                }
            }
        }
        Ok(m)
    }

    pub fn penalty(&self) -> DMatrix<f64> {
        let p = self.n_coef();
        let mut pen = DMatrix::zeros(p, p);
        for (term, range) in self.terms.iter().zip(self.term_ranges()) {
            if let Term::Smooth { lambda, .. } = term {
                for j in (range.start + 3)..range.end {
                    pen[(j, j)] = *lambda;
                }
            }
        }
        pen
    }
}

/// Degrees of freedom of a single smoother beyond its constant and linear
/// parts, for an unweighted fit.
fn smoother_df(gram: &DMatrix<f64>, n_basis: usize, lambda: f64) -> Result<f64> {
    let mut a = gram.clone();
    for j in 4..=n_basis {
        a[(j, j)] += lambda;
    }
    let inv = inverse_spd(&a)?;
    Ok(partial_trace(&inv, gram, 0..n_basis + 1) - 2.0)
}

/// Bisection on `log10 λ` so the smoother spends `target_df` beyond linear.
pub fn lambda_for_df(basis: &SplineBasis, x: &[f64], target_df: f64) -> Result<f64> {
    let k = basis.n_cols();
    let mut design = DMatrix::zeros(x.len(), k + 1);
    let mut buf = vec![0.0; k];
    for (i, xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        basis.eval_into(*xi, &mut buf);
        for (j, v) in buf.iter().enumerate() {
            design[(i, j + 1)] = *v;
        }
    }
    let gram = design.transpose() * &design;

    let max_df = smoother_df(&gram, k, 10f64.powf(LOG10_LAMBDA_MIN))?;
    let min_df = smoother_df(&gram, k, 10f64.powf(LOG10_LAMBDA_MAX))?;
    if target_df >= max_df {
        return Ok(10f64.powf(LOG10_LAMBDA_MIN));
    }
    if target_df <= min_df {
        return Ok(10f64.powf(LOG10_LAMBDA_MAX));
    }

    // df falls as λ grows.
    let (mut lo, mut hi) = (LOG10_LAMBDA_MIN, LOG10_LAMBDA_MAX);
    for _ in 0..LAMBDA_SEARCH_STEPS {
        let mid = 0.5 * (lo + hi);
        if smoother_df(&gram, k, 10f64.powf(mid))? > target_df {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(10f64.powf(0.5 * (lo + hi)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_has_cubic_and_knot_columns() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let basis = SplineBasis::from_data(&x, 5).unwrap();
        assert_eq!(basis.n_cols(), 8);
        let mut out = vec![0.0; 8];
        basis.eval_into(0.0, &mut out);
        assert!(out.iter().all(|v| *v == 0.0));
        basis.eval_into(99.0, &mut out);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!(out[3..].iter().all(|v| *v > 0.0));
    }

    #[test]
    fn lambda_hits_target_df() {
        let x: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin() + i as f64 / 50.0).collect();
        let basis = SplineBasis::from_data(&x, 10).unwrap();
        let lambda = lambda_for_df(&basis, &x, 5.0).unwrap();
        let mut design = DMatrix::zeros(x.len(), basis.n_cols() + 1);
        let mut buf = vec![0.0; basis.n_cols()];
        for (i, xi) in x.iter().enumerate() {
            design[(i, 0)] = 1.0;
            basis.eval_into(*xi, &mut buf);
            for (j, v) in buf.iter().enumerate() {
                design[(i, j + 1)] = *v;
            }
        }
        let gram = design.transpose() * &design;
        let df = smoother_df(&gram, basis.n_cols(), lambda).unwrap();
        assert!((df - 5.0).abs() < 1e-3);
    }
}
