use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::data::loader::MissingCount;
use crate::data::{FeatureSet, RESPONSE};
use crate::describe::Descriptives;
use crate::error::Result;
use crate::evaluate::ModelScore;
use crate::forecast::Forecast;
use crate::gamlss::{FamilySelection, FittedModel};
use crate::stats::TestSuite;

const INTERVAL_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub features: FeatureSet,
    pub seed: u64,
    pub train: usize,
    pub test: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub source: String,
    pub source_rows: usize,
    pub source_columns: usize,
    pub missing: Vec<MissingCount>,
    pub dropped_rows: usize,
    pub descriptives: Descriptives,
    pub tests: TestSuite,
    pub families: FamilySelection,
    pub partitions: Vec<PartitionSummary>,
    pub models: Vec<FittedModel>,
    pub scores: Vec<ModelScore>,
    pub best_model: usize,
    pub forecast: Forecast,
}

impl Report {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// The two closing prediction lines.
    pub fn prediction_lines(&self) -> [String; 2] {
        let next = &self.forecast.next_step;
        [
            format!("Predicted Oil Price for the Next Day: {}", next.predicted),
            format!(
                "Percent Deviation from True Value for the Next Day: {}%",
                next.percent_deviation
            ),
        ]
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "oil-gamlss report")?;
        writeln!(out, "=================")?;
        writeln!(out, "generated: {}", self.generated_at)?;
        writeln!(
            out,
            "source:    {} ({} rows x {} columns)",
            self.source, self.source_rows, self.source_columns
        )?;
        writeln!(out)?;

        writeln!(out, "Missing values")?;
        for m in &self.missing {
            writeln!(out, "  {:<12} {}", m.column, m.missing)?;
        }
        writeln!(
            out,
            "  total {} (rows dropped: {})",
            self.missing.iter().map(|m| m.missing).sum::<usize>(),
            self.dropped_rows
        )?;
        writeln!(out)?;

        writeln!(out, "Summary statistics ({} rows)", self.descriptives.rows)?;
        writeln!(
            out,
            "  {:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8}",
            "column", "mean", "sd", "min", "median", "max", "skew", "kurt"
        )?;
        for s in &self.descriptives.summaries {
            writeln!(
                out,
                "  {:<12} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.3} {:>8.3}",
                s.column, s.mean, s.sd, s.min, s.median, s.max, s.skewness, s.excess_kurtosis
            )?;
        }
        writeln!(out)?;

        writeln!(out, "Histograms (Sturges bins)")?;
        for h in &self.descriptives.histograms {
            let top = h.counts.iter().copied().max().unwrap_or(1).max(1);
            let bars: String = h
                .counts
                .iter()
                .map(|c| match c * 8 / top {
                    0 if *c == 0 => ' ',
                    0 | 1 => '▁',
                    2 => '▂',
                    3 => '▃',
                    4 => '▄',
                    5 => '▅',
                    6 => '▆',
                    7 => '▇',
                    _ => '█',
                })
                .collect();
            writeln!(out, "  {:<12} |{}|", h.column, bars)?;
        }
        writeln!(out)?;

        writeln!(out, "Shapiro-Wilk normality test")?;
        for t in &self.tests.normality {
            writeln!(
                out,
                "  {:<12} W = {:.5}  p = {:.4e}  {}",
                t.column,
                t.w,
                t.p_value,
                if t.reject { "non-normal" } else { "normal" }
            )?;
        }
        writeln!(out)?;

        writeln!(out, "Augmented Dickey-Fuller test (constant + trend)")?;
        for t in &self.tests.stationarity {
            writeln!(
                out,
                "  {:<12} DF = {:>8.4}  lag = {}  p {} {:.4}  {}",
                t.column,
                t.statistic,
                t.lag_order,
                if t.p_clamped && t.p_value <= 0.01 {
                    "<"
                } else if t.p_clamped {
                    ">"
                } else {
                    "="
                },
                t.p_value,
                if t.stationary { "stationary" } else { "unit root" }
            )?;
        }
        writeln!(out)?;

        let corr = &self.tests.correlation;
        writeln!(out, "Spearman correlation with {}", RESPONSE)?;
        if let Some(r) = corr.index_of(RESPONSE) {
            for (j, name) in corr.columns.iter().enumerate() {
                if j == r {
                    continue;
                }
                writeln!(
                    out,
                    "  {:<12} rho = {:>7.4}  p = {:.4e}",
                    name, corr.rho[r][j], corr.p_values[r][j]
                )?;
            }
        }
        if corr.independent_of_response.is_empty() {
            writeln!(out, "  every variable is significantly correlated")?;
        } else {
            writeln!(
                out,
                "  not significant: {}",
                corr.independent_of_response.join(", ")
            )?;
        }
        writeln!(out)?;

        writeln!(out, "Distribution families for {}", RESPONSE)?;
        writeln!(
            out,
            "  {:<6} {:>3} {:>12} {:>12} {:>12}",
            "family", "df", "GD", "AIC", "SBC"
        )?;
        for f in &self.families.fits {
            writeln!(
                out,
                "  {:<6} {:>3} {:>12.3} {:>12.3} {:>12.3}{}",
                f.family.label(),
                f.df,
                f.global_deviance,
                f.aic,
                f.sbc,
                if f.family == self.families.selected {
                    "  <- selected"
                } else {
                    ""
                }
            )?;
        }
        writeln!(out)?;

        writeln!(out, "Partitions")?;
        for p in &self.partitions {
            writeln!(
                out,
                "  {:<20} seed {}  train {}  test {}",
                p.features.label(),
                p.seed,
                p.train,
                p.test
            )?;
        }
        writeln!(out)?;

        for m in &self.models {
            self.render_model(out, m)?;
        }

        writeln!(out, "Holdout evaluation")?;
        writeln!(
            out,
            "  {:<8} {:<44} {:>10} {:>10}",
            "model", "predictor", "MAE", "RMSE"
        )?;
        for s in &self.scores {
            writeln!(
                out,
                "  {:<8} {:<44} {:>10.6} {:>10.6}{}",
                s.model_id,
                s.description,
                s.metrics.mae,
                s.metrics.rmse,
                if s.model_id == self.best_model {
                    "  <- best"
                } else {
                    ""
                }
            )?;
        }
        writeln!(out)?;

        let f = &self.forecast;
        writeln!(
            out,
            "Prediction intervals (model {}, {} x sd {:.6}, coverage {:.1}%)",
            f.model_id,
            f.critical_value,
            f.residual_sd,
            f.coverage * 100.0
        )?;
        writeln!(
            out,
            "  {:>6} {:>10} {:>10} {:>10} {:>10}",
            "row", "actual", "predicted", "lower", "upper"
        )?;
        let skip = f.intervals.len().saturating_sub(INTERVAL_PREVIEW_ROWS);
        for r in f.intervals.iter().skip(skip) {
            writeln!(
                out,
                "  {:>6} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
                r.row, r.actual, r.predicted, r.lower, r.upper
            )?;
        }
        writeln!(out)?;

        for line in self.prediction_lines() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn render_model(&self, out: &mut String, m: &FittedModel) -> std::fmt::Result {
        writeln!(
            out,
            "Model {}: {} ({} family, {} obs)",
            m.spec.id,
            m.spec.description(),
            m.family.label(),
            m.n_obs
        )?;
        if m.is_linear() {
            writeln!(
                out,
                "  {:<12} {:>12} {:>12} {:>9}",
                "mu term", "estimate", "std.error", "t"
            )?;
            for c in &m.coefficients {
                writeln!(
                    out,
                    "  {:<12} {:>12.6} {:>12.6} {:>9.3}",
                    c.term, c.estimate, c.std_error, c.t_value
                )?;
            }
        } else {
            writeln!(
                out,
                "  {:<12} {:>12} {:>8} {:>8}",
                "smooth", "lambda", "target", "edf"
            )?;
            for s in &m.smooth_terms {
                writeln!(
                    out,
                    "  {:<12} {:>12.4e} {:>8.2} {:>8.2}",
                    s.column, s.lambda, s.target_df, s.edf
                )?;
            }
        }
        for (name, value) in &m.scalar_params {
            writeln!(out, "  {:<6} {:.6}", name, value)?;
        }
        writeln!(
            out,
            "  edf {:.2}  GD {:.3}  AIC {:.3}  SBC {:.3}  cycles {}",
            m.edf, m.global_deviance, m.aic, m.sbc, m.cycles
        )?;
        let r = &m.residuals;
        writeln!(
            out,
            "  quantile residuals: mean {:.4}  var {:.4}  skew {:.4}  kurt {:.4}  filliben {:.4}",
            r.mean, r.variance, r.skewness, r.excess_kurtosis, r.filliben
        )?;
        writeln!(out)
    }
}
