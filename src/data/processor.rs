//! Data Processor Module
//! Handles row cleaning: date parsing, lenient count coercion and the
//! load summary.

use crate::data::schema::{ColumnMapping, Field};
use crate::data::{ColumnSet, DashboardTable, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Date-only layouts, tried in order. Month-first before day-first.
const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Date-time layouts; the time part is discarded.
const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Raw sheet as read from the source file: headers plus string cells,
/// column-major. `None` marks an empty cell.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<Option<String>>>,
    pub height: usize,
}

impl RawSheet {
    fn cell(&self, column: usize, row: usize) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|c| c.get(row))
            .and_then(|v| v.as_deref())
    }
}

/// What happened during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub source_rows: usize,
    pub kept_rows: usize,
    pub dropped_bad_dates: usize,
    pub coerced_walk_ins: usize,
    pub coerced_test_drives: usize,
    pub columns: ColumnSet,
    pub shadowed: Vec<String>,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loaded {} of {} rows", self.kept_rows, self.source_rows)?;
        if self.dropped_bad_dates > 0 {
            write!(f, ", {} dropped (no valid date)", self.dropped_bad_dates)?;
        }
        let coerced = self.coerced_walk_ins + self.coerced_test_drives;
        if coerced > 0 {
            write!(f, ", {} cells set to 0", coerced)?;
        }
        if !self.shadowed.is_empty() {
            write!(f, ", ignored columns: {}", self.shadowed.join(", "))?;
        }
        Ok(())
    }
}

/// Parse a date cell. Time-of-day, if present, is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a count cell, truncating toward zero.
///
/// Returns `None` for empty, non-numeric or non-finite input; callers
/// coerce that to 0.
pub fn parse_count(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Turn a raw sheet into the clean dashboard table.
    ///
    /// Rows with a missing or unparseable date are dropped when the sheet has
    /// a date column. Unparseable counts become 0.
    pub fn normalize(sheet: &RawSheet) -> (DashboardTable, LoadSummary) {
        let mapping = ColumnMapping::infer(&sheet.headers);
        let columns = mapping.column_set();

        let mut summary = LoadSummary {
            source_rows: sheet.height,
            columns,
            shadowed: mapping.shadowed.clone(),
            ..LoadSummary::default()
        };

        if mapping.is_empty() {
            return (DashboardTable::new(columns, Vec::new()), summary);
        }

        let mut rows = Vec::with_capacity(sheet.height);
        for row in 0..sheet.height {
            let date = match mapping.source(Field::Date) {
                Some(col) => match sheet.cell(col, row).and_then(parse_date) {
                    Some(d) => Some(d),
                    None => {
                        summary.dropped_bad_dates += 1;
                        continue;
                    }
                },
                None => None,
            };

            let walk_ins = mapping.source(Field::WalkIns).map(|col| {
                Self::coerce(sheet.cell(col, row), &mut summary.coerced_walk_ins)
            });
            let test_drives = mapping.source(Field::TestDrives).map(|col| {
                Self::coerce(sheet.cell(col, row), &mut summary.coerced_test_drives)
            });

            rows.push(Record {
                date,
                walk_ins,
                test_drives,
            });
        }

        summary.kept_rows = rows.len();
        (DashboardTable::new(columns, rows), summary)
    }

    fn coerce(cell: Option<&str>, coerced: &mut usize) -> i64 {
        match cell.and_then(parse_count) {
            Some(v) => v,
            None => {
                *coerced += 1;
                0
            }
        }
    }
}
