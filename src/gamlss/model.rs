use serde::Serialize;

use crate::data::{Dataset, FeatureSet};
use crate::error::{AnalysisError, Result};
use crate::family::{FamilyKind, PARAM_NAMES};
use crate::gamlss::design::{DesignTemplate, PredictorForm, Term};
use crate::gamlss::diagnostics::{quantile_residuals, summarize_residuals, ResidualSummary};
use crate::gamlss::fit::{fit_rs, FitControl};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelSpec {
    pub id: usize,
    pub features: FeatureSet,
    pub form: PredictorForm,
}

impl ModelSpec {
    pub fn name(&self) -> String {
        format!("model {}", self.id)
    }

    pub fn description(&self) -> String {
        let form = match self.form {
            PredictorForm::Linear => "linear".to_string(),
            PredictorForm::Smooth { df, .. } => format!("smooth (cubic spline, {} df)", df),
        };
        format!("{}, {}", form, self.features.label())
    }
}

/// The four candidate models: linear and smooth predictors, each with and
/// without the lagged response.
pub fn standard_specs(smooth_df: f64, knots: usize) -> Vec<ModelSpec> {
    let smooth = PredictorForm::Smooth {
        df: smooth_df,
        knots,
    };
    vec![
        ModelSpec {
            id: 1,
            features: FeatureSet::WithLag,
            form: PredictorForm::Linear,
        },
        ModelSpec {
            id: 2,
            features: FeatureSet::WithoutLag,
            form: PredictorForm::Linear,
        },
        ModelSpec {
            id: 3,
            features: FeatureSet::WithLag,
            form: smooth,
        },
        ModelSpec {
            id: 4,
            features: FeatureSet::WithoutLag,
            form: smooth,
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmoothTermSummary {
    pub column: String,
    pub lambda: f64,
    pub target_df: f64,
    /// Effective df of the term beyond its linear part.
    pub edf: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FittedModel {
    pub spec: ModelSpec,
    pub family: FamilyKind,
    #[serde(skip)]
    template: DesignTemplate,
    #[serde(skip)]
    beta: Vec<f64>,
    pub coefficients: Vec<Coefficient>,
    pub scalar_params: Vec<(String, f64)>,
    pub smooth_terms: Vec<SmoothTermSummary>,
    pub n_obs: usize,
    pub edf: f64,
    pub global_deviance: f64,
    pub aic: f64,
    pub sbc: f64,
    pub cycles: usize,
    pub residuals: ResidualSummary,
}

fn coefficient_names(template: &DesignTemplate) -> Vec<String> {
    let mut names = vec!["(Intercept)".to_string()];
    for term in template.terms() {
        match term {
            Term::Linear { column } => names.push(column.clone()),
            Term::Smooth { column, basis, .. } => {
                names.extend((0..basis.n_cols()).map(|j| format!("cs({})[{}]", column, j + 1)))
            }
        }
    }
    names
}

impl FittedModel {
    pub fn fit(
        spec: ModelSpec,
        family: FamilyKind,
        train: &Dataset,
        control: FitControl,
    ) -> Result<Self> {
        let y = train.response()?;
        let covariates = spec.features.covariates();
        let template = DesignTemplate::build(train, &covariates, spec.form)?;
        let x = template.matrix(train)?;
        let penalty = template.penalty();
        let ranges = template.term_ranges();
        let fam = family.family();

        let label = spec.name();
        let rs = fit_rs(fam, y, &x, &penalty, &ranges, control, &label)?;

        let beta: Vec<f64> = rs.mu_beta.iter().copied().collect();
        let coefficients = coefficient_names(&template)
            .into_iter()
            .enumerate()
            .map(|(j, term)| {
                let std_error = rs.mu_covariance[(j, j)].max(0.0).sqrt();
                Coefficient {
                    term,
                    estimate: beta[j],
                    std_error,
                    t_value: beta[j] / std_error,
                }
            })
            .collect();

        let scalars = fam.from_link(&{
            let mut eta = vec![0.0];
            eta.extend_from_slice(&rs.scalar_eta);
            eta
        });
        let scalar_params: Vec<(String, f64)> = PARAM_NAMES[1..fam.n_params()]
            .iter()
            .zip(&scalars[1..])
            .map(|(n, v)| (n.to_string(), *v))
            .collect();

        let smooth_terms = template
            .terms()
            .iter()
            .zip(&rs.term_edf)
            .filter_map(|(term, edf)| match term {
                Term::Smooth {
                    column,
                    lambda,
                    target_df,
                    ..
                } => Some(SmoothTermSummary {
                    column: column.clone(),
                    lambda: *lambda,
                    target_df: *target_df,
                    edf: edf - 1.0,
                }),
                Term::Linear { .. } => None,
            })
            .collect();

        let mu: Vec<f64> = (&x * &rs.mu_beta).iter().copied().collect();
        let thetas: Vec<Vec<f64>> = mu
            .iter()
            .map(|m| {
                let mut theta = vec![*m];
                theta.extend_from_slice(&scalars[1..]);
                theta
            })
            .collect();
        let residuals = summarize_residuals(&quantile_residuals(fam, y, &thetas));

        let n = y.len();
        let edf = rs.mu_edf + (fam.n_params() - 1) as f64;
        let gd = rs.global_deviance;
        let model = Self {
            spec,
            family,
            template,
            beta,
            coefficients,
            scalar_params,
            smooth_terms,
            n_obs: n,
            edf,
            global_deviance: gd,
            aic: gd + 2.0 * edf,
            sbc: gd + (n as f64).ln() * edf,
            cycles: rs.cycles,
            residuals,
        };
        tracing::info!(
            model = %model.spec.name(),
            family = family.label(),
            cycles = model.cycles,
            gd = model.global_deviance,
            aic = model.aic,
            edf = model.edf,
            "Model fitted"
        );
        Ok(model)
    }

    /// Location parameter `mu` for each row of `data`.
    pub fn predict_mu(&self, data: &Dataset) -> Result<Vec<f64>> {
        let x = self.template.matrix(data)?;
        if x.ncols() != self.beta.len() {
            return Err(AnalysisError::Data(format!(
                "design has {} columns, model has {} coefficients",
                x.ncols(),
                self.beta.len()
            )));
        }
        Ok((0..x.nrows())
            .map(|i| x.row(i).iter().zip(&self.beta).map(|(a, b)| a * b).sum())
            .collect())
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.scalar_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn is_linear(&self) -> bool {
        self.spec.form == PredictorForm::Linear
    }
}
