//! Rigby–Stasinopoulos cyclic fitting. The location parameter carries a
//! (possibly penalized) linear predictor; scale and shape parameters are
//! constants on their link scale. Each parameter is updated in turn by
//! penalized IRLS with score-squared working weights and step halving.

use nalgebra::{DMatrix, DVector};

use crate::error::{AnalysisError, Result};
use crate::family::Family;
use crate::gamlss::linalg::{inverse_spd, partial_trace, solve_spd, weighted_gram};

const MIN_WEIGHT: f64 = 1e-15;
const MAX_HALVINGS: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct FitControl {
    pub max_cycles: usize,
    pub tolerance: f64,
    pub inner_cycles: usize,
}

impl Default for FitControl {
    fn default() -> Self {
        Self {
            max_cycles: 200,
            tolerance: 0.001,
            inner_cycles: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RsFit {
    pub mu_beta: DVector<f64>,
    /// Link-scale values of sigma, nu, tau.
    pub scalar_eta: Vec<f64>,
    pub global_deviance: f64,
    pub mu_edf: f64,
    pub term_edf: Vec<f64>,
    pub mu_covariance: DMatrix<f64>,
    pub cycles: usize,
}

struct State<'a> {
    family: &'a dyn Family,
    y: &'a [f64],
    mu_eta: Vec<f64>,
    scalar_eta: Vec<f64>,
}

pub(crate) fn log_lik_at(family: &dyn Family, y: f64, eta: &[f64]) -> f64 {
    let mut theta = [0.0; 4];
    for (k, (link, e)) in family.links().iter().zip(eta).enumerate() {
        theta[k] = link.inverse(*e);
    }
    let v = family.log_pdf(y, &theta[..eta.len()]);
    if v.is_finite() {
        v
    } else {
        f64::NEG_INFINITY
    }
}

impl<'a> State<'a> {
    fn eta_row(&self, mu_eta: f64) -> [f64; 4] {
        let mut eta = [0.0; 4];
        eta[0] = mu_eta;
        eta[1..=self.scalar_eta.len()].copy_from_slice(&self.scalar_eta);
        eta
    }

    fn deviance_with(&self, mu_eta: &[f64], scalar_eta: &[f64]) -> f64 {
        let np = 1 + scalar_eta.len();
        let mut eta = [0.0; 4];
        eta[1..np].copy_from_slice(scalar_eta);
        let mut ll = 0.0;
        for (yi, m) in self.y.iter().zip(mu_eta) {
            eta[0] = *m;
            ll += log_lik_at(self.family, *yi, &eta[..np]);
        }
        if ll.is_finite() {
            -2.0 * ll
        } else {
            f64::INFINITY
        }
    }

    fn deviance(&self) -> f64 {
        self.deviance_with(&self.mu_eta, &self.scalar_eta)
    }

    /// Central-difference score of each observation w.r.t. link parameter `k`.
    fn scores(&self, k: usize) -> Vec<f64> {
        let np = 1 + self.scalar_eta.len();
        (0..self.y.len())
            .map(|i| {
                let mut eta = self.eta_row(self.mu_eta[i]);
                let base = eta[k];
                let h = 1e-5 * (1.0 + base.abs());
                eta[k] = base + h;
                let up = log_lik_at(self.family, self.y[i], &eta[..np]);
                eta[k] = base - h;
                let down = log_lik_at(self.family, self.y[i], &eta[..np]);
                let u = (up - down) / (2.0 * h);
                if u.is_finite() {
                    u
                } else {
                    0.0
                }
            })
            .collect()
    }
}

fn mat_vec(x: &DMatrix<f64>, beta: &DVector<f64>) -> Vec<f64> {
    (x * beta).iter().copied().collect()
}

fn mean_weight(w: &[f64]) -> f64 {
    (w.iter().sum::<f64>() / w.len().max(1) as f64).max(MIN_WEIGHT)
}

/// Fit `family` with `mu = X β` (penalty `P`, scaled by the mean working
/// weight) and constant remaining parameters.
pub fn fit_rs(
    family: &dyn Family,
    y: &[f64],
    x: &DMatrix<f64>,
    penalty: &DMatrix<f64>,
    term_ranges: &[std::ops::Range<usize>],
    control: FitControl,
    label: &str,
) -> Result<RsFit> {
    let n = y.len();
    let p = x.ncols();
    if x.nrows() != n {
        return Err(AnalysisError::Data(format!(
            "design has {} rows, response has {}",
            x.nrows(),
            n
        )));
    }
    if n <= p + family.n_params() {
        return Err(AnalysisError::InsufficientData {
            what: format!("fitting {}", label),
            needed: p + family.n_params() + 1,
            got: n,
        });
    }

    // Start from the penalized least-squares fit of the location.
    let y_vec = DVector::from_column_slice(y);
    let gram = x.transpose() * x;
    let mut beta = solve_spd(&(&gram + penalty), &(x.transpose() * &y_vec))?;
    let mu_eta = mat_vec(x, &beta);
    let resid_sd = {
        let r: Vec<f64> = y.iter().zip(&mu_eta).map(|(a, b)| a - b).collect();
        let m = r.iter().sum::<f64>() / n as f64;
        (r.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64)
            .sqrt()
            .max(1e-8)
    };
    let mut theta0 = family.initial(y);
    theta0[0] = mu_eta[0];
    theta0[1] = resid_sd;
    let eta0 = family.to_link(&theta0);

    let mut state = State {
        family,
        y,
        mu_eta,
        scalar_eta: eta0[1..].to_vec(),
    };
    let mut gd = state.deviance();
    if !gd.is_finite() {
        return Err(AnalysisError::Numerical(format!(
            "{}: initial deviance is not finite",
            label
        )));
    }

    let mut cycles = 0;
    let mut converged = false;
    let mut last_delta = f64::INFINITY;
    while cycles < control.max_cycles {
        cycles += 1;
        beta = update_location(&mut state, x, penalty, beta, control)?;
        for k in 1..family.n_params() {
            update_scalar(&mut state, k, control);
        }
        let new_gd = state.deviance();
        last_delta = (gd - new_gd).abs();
        tracing::trace!(model = label, cycle = cycles, gd = new_gd, "RS cycle");
        gd = new_gd;
        if last_delta < control.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(AnalysisError::NonConvergence {
            model: label.to_string(),
            cycles,
            delta: last_delta,
        });
    }

    let u = state.scores(0);
    let w: Vec<f64> = u.iter().map(|v| (v * v).max(MIN_WEIGHT)).collect();
    let g = weighted_gram(x, &w);
    let pen = penalty * mean_weight(&w);
    let cov = inverse_spd(&(&g + &pen))?;
    let term_edf: Vec<f64> = term_ranges
        .iter()
        .map(|r| partial_trace(&cov, &g, r.clone()))
        .collect();
    let mu_edf = partial_trace(&cov, &g, 0..p);

    tracing::debug!(model = label, cycles, gd, mu_edf, "RS fit converged");
    Ok(RsFit {
        mu_beta: beta,
        scalar_eta: state.scalar_eta,
        global_deviance: gd,
        mu_edf,
        term_edf,
        mu_covariance: cov,
        cycles,
    })
}

fn update_location(
    state: &mut State<'_>,
    x: &DMatrix<f64>,
    penalty: &DMatrix<f64>,
    mut beta: DVector<f64>,
    control: FitControl,
) -> Result<DVector<f64>> {
    for _ in 0..control.inner_cycles {
        let u = state.scores(0);
        let w: Vec<f64> = u.iter().map(|v| (v * v).max(MIN_WEIGHT)).collect();
        let pen = penalty * mean_weight(&w);
        let g = weighted_gram(x, &w);
        let score = x.transpose() * DVector::from_vec(u);
        let rhs = &g * &beta + score;
        let target = solve_spd(&(&g + &pen), &rhs)?;

        let objective = |b: &DVector<f64>, eta: &[f64]| {
            state.deviance_with(eta, &state.scalar_eta) + b.dot(&(&pen * b))
        };
        let current = objective(&beta, &state.mu_eta);
        let mut candidate = target;
        let mut accepted = None;
        for _ in 0..MAX_HALVINGS {
            let eta = mat_vec(x, &candidate);
            let value = objective(&candidate, &eta);
            if value <= current {
                accepted = Some((value, eta));
                break;
            }
            candidate = (&candidate + &beta) * 0.5;
        }
        let Some((value, eta)) = accepted else {
            break;
        };
        beta = candidate;
        state.mu_eta = eta;
        if current - value < 0.1 * control.tolerance {
            break;
        }
    }
    Ok(beta)
}

fn update_scalar(state: &mut State<'_>, k: usize, control: FitControl) {
    for _ in 0..control.inner_cycles {
        let u = state.scores(k);
        let num: f64 = u.iter().sum();
        let den: f64 = u.iter().map(|v| (v * v).max(MIN_WEIGHT)).sum();
        let current = state.deviance();
        let old = state.scalar_eta[k - 1];
        let mut step = num / den;
        let mut improved = None;
        for _ in 0..MAX_HALVINGS {
            state.scalar_eta[k - 1] = old + step;
            let value = state.deviance();
            if value <= current {
                improved = Some(value);
                break;
            }
            step *= 0.5;
        }
        match improved {
            Some(value) if current - value >= 0.1 * control.tolerance => {}
            Some(_) => break,
            None => {
                state.scalar_eta[k - 1] = old;
                break;
            }
        }
    }
}
