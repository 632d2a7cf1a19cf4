//! Clean Table Module
//! Typed records produced by the normalizer and the date-range filter over them.

use chrono::NaiveDate;

/// Which semantic columns a table carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSet {
    pub date: bool,
    pub walk_ins: bool,
    pub test_drives: bool,
}

impl ColumnSet {
    /// Conversion rate is derivable only when both counts are present.
    pub fn has_conversion_rate(&self) -> bool {
        self.walk_ins && self.test_drives
    }

    pub fn is_empty(&self) -> bool {
        !self.date && !self.walk_ins && !self.test_drives
    }
}

/// Conversion rate in percent; zero walk-ins yields 0.
pub fn conversion_rate(walk_ins: i64, test_drives: i64) -> f64 {
    if walk_ins > 0 {
        test_drives as f64 / walk_ins as f64 * 100.0
    } else {
        0.0
    }
}

/// One cleaned row. A field is `None` exactly when its column is absent
/// from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub walk_ins: Option<i64>,
    pub test_drives: Option<i64>,
}

impl Record {
    pub fn conversion_rate(&self) -> Option<f64> {
        Some(conversion_rate(self.walk_ins?, self.test_drives?))
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they are reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days between the bounds (0 for a single-day range).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Cleaned, typed dashboard table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardTable {
    columns: ColumnSet,
    rows: Vec<Record>,
}

impl DashboardTable {
    pub fn new(columns: ColumnSet, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest date in the table.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let mut dates = self.rows.iter().filter_map(|r| r.date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(DateRange::new(min, max))
    }

    /// New table holding only rows dated within `range`.
    ///
    /// Tables without a date column are returned unchanged.
    pub fn filter_by_date(&self, range: DateRange) -> DashboardTable {
        if !self.columns.date {
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .filter(|r| r.date.is_some_and(|d| range.contains(d)))
            .copied()
            .collect();

        DashboardTable::new(self.columns, rows)
    }
}
