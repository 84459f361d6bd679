use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::data::{analysis_columns, Dataset};
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub dataset: Dataset,
    /// Column count of the source file, before restriction.
    pub source_columns: usize,
    pub source_rows: usize,
    pub missing: Vec<MissingCount>,
    pub dropped_rows: usize,
}

impl LoadedTable {
    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|m| m.missing).sum()
    }
}

pub fn load_csv(path: &Path) -> Result<LoadedTable> {
    let file = std::fs::File::open(path)?;
    load_csv_from_reader(file)
}

/// Restrict a headed CSV to the analysis columns. Empty, `NA` and `NaN`
/// cells count as missing; rows holding any missing cell are dropped.
pub fn load_csv_from_reader<R: Read>(reader: R) -> Result<LoadedTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let wanted = analysis_columns();
    let positions = wanted
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == *name)
                .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::new(); wanted.len()];
    let mut source_rows = 0usize;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        source_rows += 1;
        for (c, &pos) in positions.iter().enumerate() {
            let cell = record.get(pos).unwrap_or("");
            raw[c].push(parse_cell(cell, wanted[c], row + 1)?);
        }
    }

    let missing = wanted
        .iter()
        .zip(&raw)
        .map(|(name, col)| MissingCount {
            column: name.to_string(),
            missing: col.iter().filter(|v| v.is_none()).count(),
        })
        .collect();

    let complete: Vec<usize> = (0..source_rows)
        .filter(|&r| raw.iter().all(|col| col[r].is_some()))
        .collect();
    let dropped_rows = source_rows - complete.len();
    if dropped_rows > 0 {
        tracing::warn!(dropped_rows, "Dropping rows with missing values");
    }

    let columns = raw
        .iter()
        .map(|col| complete.iter().filter_map(|&r| col[r]).collect())
        .collect();
    let dataset = Dataset::new(wanted.iter().map(|s| s.to_string()).collect(), columns)?;

    Ok(LoadedTable {
        dataset,
        source_columns: headers.len(),
        source_rows,
        missing,
        dropped_rows,
    })
}

fn parse_cell(cell: &str, column: &str, row: usize) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| AnalysisError::Parse {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_handles_missing_markers() {
        assert_eq!(parse_cell("", "x", 1).unwrap(), None);
        assert_eq!(parse_cell("NA", "x", 1).unwrap(), None);
        assert_eq!(parse_cell(" nan ", "x", 1).unwrap(), None);
        assert_eq!(parse_cell("1.5", "x", 1).unwrap(), Some(1.5));
        assert!(parse_cell("abc", "x", 1).is_err());
    }
}
