use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::data::{self, synthetic, FeatureSet, LoadedTable, Partition};
use crate::describe::describe;
use crate::evaluate::{best_model, holdout_predictions, score_model};
use crate::family::FamilyKind;
use crate::forecast::forecast;
use crate::gamlss::{select_family, standard_specs, train_models, FitControl};
use crate::report::{PartitionSummary, Report};
use crate::stats::run_tests;

/// Where the observations come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic { rows: usize, seed: u64 },
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            DataSource::Csv(path) => path.display().to_string(),
            DataSource::Synthetic { rows, seed } => {
                format!("synthetic ({} rows, seed {})", rows, seed)
            }
        }
    }

    pub fn load(&self) -> Result<LoadedTable> {
        match self {
            DataSource::Csv(path) => data::load_csv(path)
                .with_context(|| format!("failed to load dataset {}", path.display())),
            DataSource::Synthetic { rows, seed } => {
                let dataset = synthetic::generate(*rows, *seed)
                    .context("failed to generate synthetic dataset")?;
                let missing = dataset
                    .names()
                    .iter()
                    .map(|name| data::loader::MissingCount {
                        column: name.clone(),
                        missing: 0,
                    })
                    .collect();
                Ok(LoadedTable {
                    source_columns: dataset.n_cols(),
                    source_rows: dataset.n_rows(),
                    dataset,
                    missing,
                    dropped_rows: 0,
                })
            }
        }
    }
}

/// Seed used for a feature subset's partition. The two subsets draw
/// independent splits.
pub fn partition_seed(base: u64, features: FeatureSet) -> u64 {
    match features {
        FeatureSet::WithLag => base,
        FeatureSet::WithoutLag => base.wrapping_add(1),
    }
}

/// Run the whole analysis and write the optional JSON report and plots.
pub fn run(config: &Config, source: &DataSource) -> Result<Report> {
    let table = source.load()?;
    tracing::info!(
        source = %source.describe(),
        rows = table.dataset.n_rows(),
        missing = table.total_missing(),
        dropped = table.dropped_rows,
        "Dataset loaded"
    );
    let dataset = &table.dataset;

    let descriptives = describe(dataset);
    let tests = run_tests(dataset, config.tests.alpha, config.tests.adf_lags)
        .context("statistical tests failed")?;
    let families =
        select_family(dataset.response()?).context("distribution family selection failed")?;

    let split = config.split;
    let n = dataset.n_rows();
    let with_lag = data::split_indices(
        n,
        split.train_fraction,
        partition_seed(split.seed, FeatureSet::WithLag),
    )?;
    let without_lag = data::split_indices(
        n,
        split.train_fraction,
        partition_seed(split.seed, FeatureSet::WithoutLag),
    )?;
    let partition_for = |features: FeatureSet| -> Partition {
        match features {
            FeatureSet::WithLag => with_lag.clone(),
            FeatureSet::WithoutLag => without_lag.clone(),
        }
    };
    let partitions = [FeatureSet::WithLag, FeatureSet::WithoutLag]
        .into_iter()
        .map(|features| {
            let p = partition_for(features);
            PartitionSummary {
                features,
                seed: partition_seed(split.seed, features),
                train: p.train.len(),
                test: p.test.len(),
            }
        })
        .collect();

    let control = FitControl {
        max_cycles: config.model.max_cycles,
        tolerance: config.model.tolerance,
        ..FitControl::default()
    };
    let specs = standard_specs(config.model.smooth_df, config.model.knots);
    let trained = train_models(dataset, &specs, FamilyKind::Shash, partition_for, control)
        .context("model fitting failed")?;

    let mut scores = Vec::with_capacity(trained.len());
    let mut holdouts = Vec::with_capacity(trained.len());
    for t in &trained {
        let holdout = holdout_predictions(t, dataset)?;
        scores.push(score_model(t, &holdout)?);
        holdouts.push(holdout);
    }
    let best = best_model(&scores)
        .map(|s| s.model_id)
        .context("no model was scored")?;
    let best_idx = trained
        .iter()
        .position(|t| t.model.spec.id == best)
        .context("best model missing from trained set")?;
    tracing::info!(model = best, "Best model by holdout RMSE");

    let forecast = forecast(best, &holdouts[best_idx], config.forecast.critical_value)
        .context("forecast failed")?;

    let report = Report {
        generated_at: chrono::Utc::now().to_rfc3339(),
        source: source.describe(),
        source_rows: table.source_rows,
        source_columns: table.source_columns,
        missing: table.missing.clone(),
        dropped_rows: table.dropped_rows,
        descriptives,
        tests,
        families,
        partitions,
        models: trained.into_iter().map(|t| t.model).collect(),
        scores,
        best_model: best,
        forecast,
    };

    if let Some(path) = &config.output.json_path {
        report
            .write_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "JSON report written");
    }
    if let Some(dir) = &config.output.plot_dir {
        write_plots(dir, dataset, &report)?;
    }
    Ok(report)
}

#[cfg(feature = "plots")]
fn write_plots(dir: &std::path::Path, dataset: &data::Dataset, report: &Report) -> Result<()> {
    let written = crate::plot::render_all(
        dir,
        data::RESPONSE,
        dataset.response()?,
        &report.descriptives.histograms,
        &report.forecast,
    )?;
    tracing::info!(files = written.len(), dir = %dir.display(), "Plots written");
    Ok(())
}

#[cfg(not(feature = "plots"))]
fn write_plots(dir: &std::path::Path, _dataset: &data::Dataset, _report: &Report) -> Result<()> {
    tracing::warn!(dir = %dir.display(), "Built without the plots feature; skipping plots");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_subsets_use_distinct_seeds() {
        assert_eq!(partition_seed(123, FeatureSet::WithLag), 123);
        assert_eq!(partition_seed(123, FeatureSet::WithoutLag), 124);
    }

    #[test]
    fn synthetic_source_reports_no_missing_values() {
        let table = DataSource::Synthetic { rows: 50, seed: 1 }.load().unwrap();
        assert_eq!(table.source_rows, 50);
        assert_eq!(table.total_missing(), 0);
    }
}
