use std::io::Write;

use oil_gamlss::data::{
    analysis_columns, load_csv, load_csv_from_reader, synthetic, COVARIATES, LAG, RESPONSE,
};
use oil_gamlss::error::AnalysisError;

fn header_with_extra() -> String {
    let mut cols = vec!["Date".to_string()];
    cols.extend(analysis_columns().iter().map(|s| s.to_string()));
    cols.push("CL2_log".to_string());
    cols.join(",")
}

fn row(date: &str, values: &[String]) -> String {
    let mut cells = vec![date.to_string()];
    cells.extend(values.iter().cloned());
    cells.push("1.0".to_string());
    cells.join(",")
}

#[test]
fn keeps_only_analysis_columns() {
    let ds = synthetic::generate(20, 4).unwrap();
    let mut csv = header_with_extra();
    csv.push('\n');
    for r in 0..ds.n_rows() {
        let values: Vec<String> = ds
            .iter_columns()
            .map(|(_, col)| format!("{:.10}", col[r]))
            .collect();
        csv.push_str(&row(&format!("2020-01-{:02}", r + 1), &values));
        csv.push('\n');
    }

    let table = load_csv_from_reader(csv.as_bytes()).unwrap();
    assert_eq!(table.source_columns, 13);
    assert_eq!(table.source_rows, 20);
    assert_eq!(table.dataset.n_cols(), 2 + COVARIATES.len());
    assert_eq!(table.dataset.names()[0], RESPONSE);
    assert_eq!(table.dataset.names()[1], LAG);
    assert_eq!(table.total_missing(), 0);
    let y = table.dataset.response().unwrap();
    assert!((y[7] - ds.response().unwrap()[7]).abs() < 1e-8);
}

#[test]
fn rows_with_missing_cells_are_counted_and_dropped() {
    let n_cols = analysis_columns().len();
    let full: Vec<String> = (0..n_cols).map(|c| format!("{}.5", c)).collect();
    let mut gap = full.clone();
    gap[3] = "NA".to_string();
    gap[5] = String::new();

    let csv = format!(
        "{}\n{}\n{}\n{}\n",
        header_with_extra(),
        row("d1", &full),
        row("d2", &gap),
        row("d3", &full)
    );
    let table = load_csv_from_reader(csv.as_bytes()).unwrap();
    assert_eq!(table.source_rows, 3);
    assert_eq!(table.dropped_rows, 1);
    assert_eq!(table.total_missing(), 2);
    assert_eq!(table.missing[3].missing, 1);
    assert_eq!(table.dataset.n_rows(), 2);
}

#[test]
fn missing_column_is_reported_by_name() {
    let csv = "OILPRICE,respLAG\n1.0,2.0\n";
    match load_csv_from_reader(csv.as_bytes()) {
        Err(AnalysisError::MissingColumn(name)) => assert_eq!(name, COVARIATES[0]),
        other => panic!("unexpected result: {:?}", other.map(|t| t.source_rows)),
    }
}

#[test]
fn unparsable_cell_is_an_error() {
    let n_cols = analysis_columns().len();
    let mut values: Vec<String> = (0..n_cols).map(|_| "1.0".to_string()).collect();
    values[0] = "abc".to_string();
    let csv = format!("{}\n{}\n", header_with_extra(), row("d1", &values));
    assert!(matches!(
        load_csv_from_reader(csv.as_bytes()),
        Err(AnalysisError::Parse { row: 1, .. })
    ));
}

#[test]
fn load_csv_reads_from_disk() {
    let n_cols = analysis_columns().len();
    let values: Vec<String> = (0..n_cols).map(|c| format!("{}", c + 1)).collect();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", header_with_extra()).unwrap();
    writeln!(file, "{}", row("d1", &values)).unwrap();
    writeln!(file, "{}", row("d2", &values)).unwrap();
    let table = load_csv(file.path()).unwrap();
    assert_eq!(table.dataset.n_rows(), 2);
    assert_eq!(table.dataset.column(LAG).unwrap(), &[2.0, 2.0]);
}
