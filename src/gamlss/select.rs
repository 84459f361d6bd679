use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::family::{sample_sd, Family, FamilyKind, PARAM_NAMES};
use crate::gamlss::fit::log_lik_at;

const MAX_ITERS: u64 = 20_000;
const SD_TOLERANCE: f64 = 1e-10;
const TIE_EPS: f64 = 1e-6;
const RESTARTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct FamilyFit {
    pub family: FamilyKind,
    pub params: Vec<(String, f64)>,
    pub df: usize,
    pub global_deviance: f64,
    pub aic: f64,
    pub sbc: f64,
    pub iterations: u64,
}

impl FamilyFit {
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilySelection {
    pub fits: Vec<FamilyFit>,
    pub selected: FamilyKind,
}

impl FamilySelection {
    pub fn selected_fit(&self) -> Option<&FamilyFit> {
        self.fits.iter().find(|f| f.family == self.selected)
    }
}

struct NegLogLik<'a> {
    family: &'a dyn Family,
    y: &'a [f64],
}

impl CostFunction for NegLogLik<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, eta: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let ll: f64 = self
            .y
            .iter()
            .map(|&yi| log_lik_at(self.family, yi, eta))
            .sum();
        Ok(if ll.is_finite() { -ll } else { f64::MAX / 4.0 })
    }
}

fn initial_simplex(eta0: &[f64], mu_step: f64) -> Vec<Vec<f64>> {
    let mut simplex = vec![eta0.to_vec()];
    for k in 0..eta0.len() {
        let mut v = eta0.to_vec();
        v[k] += if k == 0 { mu_step } else { 0.25 };
        simplex.push(v);
    }
    simplex
}

/// Maximum-likelihood fit of a constant-parameter family on the link scale,
/// restarting Nelder–Mead from its best point until it stops improving.
pub fn fit_family(kind: FamilyKind, y: &[f64]) -> Result<FamilyFit> {
    let family = kind.family();
    let k = family.n_params();
    if y.len() <= k {
        return Err(AnalysisError::InsufficientData {
            what: format!("{} fit", family.name()),
            needed: k + 1,
            got: y.len(),
        });
    }

    let mut eta = family.to_link(&family.initial(y));
    let mu_step = 0.5 * sample_sd(y);
    let mut best_cost = f64::INFINITY;
    let mut iterations = 0;
    for _ in 0..RESTARTS {
        let problem = NegLogLik { family, y };
        let solver = NelderMead::new(initial_simplex(&eta, mu_step))
            .with_sd_tolerance(SD_TOLERANCE)
            .map_err(|e| AnalysisError::Numerical(e.to_string()))?;
        let res = Executor::new(problem, solver)
            .configure(|state| state.max_iters(MAX_ITERS))
            .run()
            .map_err(|e| AnalysisError::Numerical(format!("{}: {}", family.name(), e)))?;
        let state = res.state();
        iterations += state.get_iter();
        let cost = state.get_best_cost();
        if let Some(best) = state.get_best_param() {
            eta = best.clone();
        }
        let improved = best_cost - cost;
        best_cost = best_cost.min(cost);
        if improved < 1e-8 {
            break;
        }
    }

    let theta = family.from_link(&eta);
    if !best_cost.is_finite() || best_cost >= f64::MAX / 8.0 || !family.is_valid(&theta) {
        return Err(AnalysisError::Numerical(format!(
            "{} fit produced no finite likelihood",
            family.name()
        )));
    }

    let n = y.len() as f64;
    let global_deviance = 2.0 * best_cost;
    let fit = FamilyFit {
        family: kind,
        params: PARAM_NAMES
            .iter()
            .zip(&theta)
            .map(|(name, v)| (name.to_string(), *v))
            .collect(),
        df: k,
        global_deviance,
        aic: global_deviance + 2.0 * k as f64,
        sbc: global_deviance + n.ln() * k as f64,
        iterations,
    };
    tracing::debug!(
        family = family.name(),
        gd = fit.global_deviance,
        aic = fit.aic,
        "Family fitted"
    );
    Ok(fit)
}

/// Lowest AIC; near ties fall to SBC, then GD, then the less flexible family.
pub fn choose_family(fits: &[FamilyFit]) -> Option<FamilyKind> {
    let mut best: Option<&FamilyFit> = None;
    for fit in fits {
        best = match best {
            None => Some(fit),
            Some(b) if better_fit(fit, b) => Some(fit),
            keep => keep,
        };
    }
    best.map(|f| f.family)
}

fn better_fit(a: &FamilyFit, b: &FamilyFit) -> bool {
    for (x, y) in [
        (a.aic, b.aic),
        (a.sbc, b.sbc),
        (a.global_deviance, b.global_deviance),
    ] {
        if (x - y).abs() > TIE_EPS {
            return x < y;
        }
    }
    false
}

pub fn select_family(y: &[f64]) -> Result<FamilySelection> {
    let fits = FamilyKind::CANDIDATES
        .iter()
        .map(|&kind| fit_family(kind, y))
        .collect::<Result<Vec<_>>>()?;
    let selected = choose_family(&fits)
        .ok_or_else(|| AnalysisError::Data("no candidate families".to_string()))?;
    tracing::info!(family = selected.label(), "Response family selected");
    Ok(FamilySelection { fits, selected })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(kind: FamilyKind, gd: f64, df: usize) -> FamilyFit {
        FamilyFit {
            family: kind,
            params: Vec::new(),
            df,
            global_deviance: gd,
            aic: gd + 2.0 * df as f64,
            sbc: gd + 7.0 * df as f64,
            iterations: 0,
        }
    }

    #[test]
    fn lowest_aic_wins() {
        let fits = vec![
            fit(FamilyKind::Pe, 100.0, 3),
            fit(FamilyKind::Shash, 90.0, 4),
        ];
        assert_eq!(choose_family(&fits), Some(FamilyKind::Shash));
    }

    #[test]
    fn exact_tie_keeps_simpler_family() {
        let fits = vec![fit(FamilyKind::JsuO, 50.0, 4), fit(FamilyKind::Shash, 50.0, 4)];
        assert_eq!(choose_family(&fits), Some(FamilyKind::JsuO));
    }
}
