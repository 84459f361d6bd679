use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Built-in configuration used when no config file is present.
pub const EMBEDDED_DEFAULT: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub tests: TestsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 123,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TestsConfig {
    pub alpha: f64,
    /// ADF lag order; `None` uses trunc((n-1)^(1/3)).
    #[serde(default)]
    pub adf_lags: Option<usize>,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            adf_lags: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModelConfig {
    pub smooth_df: f64,
    pub knots: usize,
    pub max_cycles: usize,
    pub tolerance: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            smooth_df: 5.0,
            knots: 10,
            max_cycles: 200,
            tolerance: 0.001,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ForecastConfig {
    pub critical_value: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            critical_value: crate::forecast::Z_99,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json_path: Option<PathBuf>,
    #[serde(default)]
    pub plot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Read `.env`, then the TOML file at `path`, then apply `OIL_GAMLSS_DATA`.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Like [`Config::load`], but falls back to the embedded defaults when
    /// `path` does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        dotenvy::dotenv().ok();
        let mut config = Self::from_toml_str(EMBEDDED_DEFAULT)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(data_path) = std::env::var("OIL_GAMLSS_DATA") {
            if !data_path.trim().is_empty() {
                self.data.path = PathBuf::from(data_path.trim());
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let f = self.split.train_fraction;
        if !(f > 0.0 && f < 1.0) {
            bail!("split.train_fraction must be in (0, 1), got {}", f);
        }
        if !(self.tests.alpha > 0.0 && self.tests.alpha < 1.0) {
            bail!("tests.alpha must be in (0, 1), got {}", self.tests.alpha);
        }
        if !(self.model.smooth_df > 0.0) {
            bail!("model.smooth_df must be > 0, got {}", self.model.smooth_df);
        }
        if self.model.knots == 0 {
            bail!("model.knots must be > 0");
        }
        if (self.model.knots as f64) + 2.0 <= self.model.smooth_df {
            bail!(
                "model.knots ({}) too small for smooth_df {}",
                self.model.knots,
                self.model.smooth_df
            );
        }
        if self.model.max_cycles == 0 {
            bail!("model.max_cycles must be > 0");
        }
        if !(self.model.tolerance > 0.0) {
            bail!("model.tolerance must be > 0, got {}", self.model.tolerance);
        }
        if !(self.forecast.critical_value > 0.0) {
            bail!(
                "forecast.critical_value must be > 0, got {}",
                self.forecast.critical_value
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
[data]
path = "data/oil.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/oil.csv"));
        assert!((config.split.train_fraction - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.split.seed, 123);
        assert!((config.model.smooth_df - 5.0).abs() < f64::EPSILON);
        assert!((config.forecast.critical_value - 2.575).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
        assert!(config.tests.adf_lags.is_none());
    }

    #[test]
    fn embedded_default_is_valid() {
        let config = Config::from_toml_str(EMBEDDED_DEFAULT).unwrap();
        assert_eq!(config.model.knots, 10);
        assert!(config.output.json_path.is_none());
    }

    #[test]
    fn rejects_train_fraction_out_of_range() {
        let err = Config::from_toml_str(
            r#"
[data]
path = "x.csv"

[split]
train_fraction = 1.0
seed = 1
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_too_few_knots() {
        let err = Config::from_toml_str(
            r#"
[data]
path = "x.csv"

[model]
smooth_df = 8.0
knots = 3
max_cycles = 10
tolerance = 0.01
"#,
        );
        assert!(err.is_err());
    }
}
