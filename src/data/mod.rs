pub mod loader;
pub mod split;
pub mod synthetic;

use serde::Serialize;

use crate::error::{AnalysisError, Result};

pub use loader::{load_csv, load_csv_from_reader, LoadedTable};
pub use split::{split_indices, Partition};

/// Log price of the nearest-month contract.
pub const RESPONSE: &str = "OILPRICE";
/// Response lagged by one trading day.
pub const LAG: &str = "respLAG";
pub const COVARIATES: [&str; 9] = [
    "BDIY_log",
    "SPX_log",
    "DX1_log",
    "GC1_log",
    "HO1_log",
    "USCI_log",
    "GNR_log",
    "SHCOMP_log",
    "FTSE_log",
];

/// Response first, then the lag, then the nine covariates.
pub fn analysis_columns() -> Vec<&'static str> {
    let mut cols = vec![RESPONSE, LAG];
    cols.extend_from_slice(&COVARIATES);
    cols
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureSet {
    WithLag,
    WithoutLag,
}

impl FeatureSet {
    pub fn covariates(self) -> Vec<&'static str> {
        let mut cols = Vec::with_capacity(COVARIATES.len() + 1);
        if self == FeatureSet::WithLag {
            cols.push(LAG);
        }
        cols.extend_from_slice(&COVARIATES);
        cols
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureSet::WithLag => "covariates + lag",
            FeatureSet::WithoutLag => "covariates, no lag",
        }
    }
}

/// Column-major table of complete numeric observations in chronological order.
#[derive(Debug, Clone)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(AnalysisError::Data(format!(
                "{} column names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            let n = first.len();
            if let Some((i, _)) = columns.iter().enumerate().find(|(_, c)| c.len() != n) {
                return Err(AnalysisError::Data(format!(
                    "column '{}' has {} rows, expected {}",
                    names[i],
                    columns[i].len(),
                    n
                )));
            }
        }
        Ok(Self { names, columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
    }

    pub fn response(&self) -> Result<&[f64]> {
        self.require(RESPONSE)
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Rows at `indices`, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Dataset> {
        let n = self.n_rows();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(AnalysisError::Data(format!(
                "row index {} out of range for {} rows",
                bad, n
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| indices.iter().map(|&i| c[i]).collect())
            .collect();
        Ok(Dataset {
            names: self.names.clone(),
            columns,
        })
    }
}
