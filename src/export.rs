//! Export Module
//! Writes the filtered table as CSV and saves rendered chart reports.

use crate::data::{DashboardTable, Field};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const CONVERSION_RATE_COLUMN: &str = "conversion_rate";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build CSV: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serializes dashboard tables with Polars.
pub struct CsvExporter;

impl CsvExporter {
    /// Build a DataFrame holding only the columns present in `table`, in
    /// the order date, walk_ins, test_drives, conversion_rate.
    pub fn to_dataframe(table: &DashboardTable) -> PolarsResult<DataFrame> {
        let present = table.columns();
        let rows = table.rows();
        let mut columns: Vec<Column> = Vec::new();

        if present.date {
            let dates: Vec<String> = rows
                .iter()
                .map(|r| r.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default())
                .collect();
            columns.push(Column::new(Field::Date.name().into(), dates));
        }
        if present.walk_ins {
            let walk_ins: Vec<i64> = rows.iter().map(|r| r.walk_ins.unwrap_or(0)).collect();
            columns.push(Column::new(Field::WalkIns.name().into(), walk_ins));
        }
        if present.test_drives {
            let test_drives: Vec<i64> = rows.iter().map(|r| r.test_drives.unwrap_or(0)).collect();
            columns.push(Column::new(Field::TestDrives.name().into(), test_drives));
        }
        if present.has_conversion_rate() {
            let rates: Vec<f64> = rows
                .iter()
                .map(|r| r.conversion_rate().unwrap_or(0.0))
                .collect();
            columns.push(Column::new(CONVERSION_RATE_COLUMN.into(), rates));
        }

        DataFrame::new(columns)
    }

    /// CSV text with a header row and no index column.
    pub fn to_csv_bytes(table: &DashboardTable) -> Result<Vec<u8>, ExportError> {
        let mut df = Self::to_dataframe(table)?;
        let mut buf: Vec<u8> = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)?;
        Ok(buf)
    }

    /// Write the table as CSV to `path`.
    pub fn write_csv(table: &DashboardTable, path: &Path) -> Result<(), ExportError> {
        let bytes = Self::to_csv_bytes(table)?;
        write_file(path, &bytes)?;
        info!(path = %path.display(), rows = table.len(), "exported CSV");
        Ok(())
    }
}

/// Write bytes to `path`.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Open an exported file with the system default application.
pub fn open_with_default_app(path: &Path) {
    if let Err(e) = open::that(path) {
        warn!(path = %path.display(), error = %e, "could not open exported file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnSet, DataLoader, DateRange, Record};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> DashboardTable {
        DashboardTable::new(
            ColumnSet {
                date: true,
                walk_ins: true,
                test_drives: true,
            },
            vec![
                Record {
                    date: Some(date(2024, 1, 1)),
                    walk_ins: Some(10),
                    test_drives: Some(2),
                },
                Record {
                    date: Some(date(2024, 1, 2)),
                    walk_ins: Some(0),
                    test_drives: Some(5),
                },
                Record {
                    date: Some(date(2024, 1, 2)),
                    walk_ins: Some(3),
                    test_drives: Some(1),
                },
            ],
        )
    }

    #[test]
    fn test_csv_has_header_and_no_index() {
        let bytes = CsvExporter::to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,walk_ins,test_drives,conversion_rate"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-01,10,2,20"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_only_present_columns_are_written() {
        let table = DashboardTable::new(
            ColumnSet {
                date: false,
                walk_ins: true,
                test_drives: false,
            },
            vec![Record {
                date: None,
                walk_ins: Some(7),
                test_drives: None,
            }],
        );
        let text = String::from_utf8(CsvExporter::to_csv_bytes(&table).unwrap()).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["walk_ins", "7"]);
    }

    #[test]
    fn test_export_round_trip_through_loader() {
        let day = date(2024, 1, 2);
        let filtered = sample().filter_by_date(DateRange::new(day, day));

        let bytes = CsvExporter::to_csv_bytes(&filtered).unwrap();
        let mut loader = DataLoader::new();
        let reloaded = loader.load_bytes(&bytes).unwrap();

        assert_eq!(reloaded.table.columns(), filtered.columns());
        assert_eq!(reloaded.table.rows(), filtered.rows());
        let rates: Vec<Option<f64>> = reloaded
            .table
            .rows()
            .iter()
            .map(|r| r.conversion_rate())
            .collect();
        let expected: Vec<Option<f64>> = filtered.rows().iter().map(|r| r.conversion_rate()).collect();
        assert_eq!(rates, expected);
    }

    #[test]
    fn test_write_csv_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filtered_customer_data.csv");
        CsvExporter::write_csv(&sample(), &path).unwrap();

        let mut loader = DataLoader::new();
        let reloaded = loader.load_file(&path).unwrap();
        assert_eq!(reloaded.table.len(), 3);
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = CsvExporter::write_csv(&sample(), &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
