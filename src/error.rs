use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("data error: {0}")]
    Data(String),

    #[error("missing column '{0}' in dataset header")]
    MissingColumn(String),

    #[error("cannot parse '{value}' in column '{column}' at row {row}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("insufficient data for {what}: need at least {needed}, got {got}")]
    InsufficientData {
        what: String,
        needed: usize,
        got: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("{model} did not converge after {cycles} cycles (last deviance change {delta:.6})")]
    NonConvergence {
        model: String,
        cycles: usize,
        delta: f64,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
