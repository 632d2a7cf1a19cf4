//! Column Inference Module
//! Maps free-form spreadsheet headers onto the dashboard's semantic fields.

use crate::data::ColumnSet;
use tracing::warn;

/// Semantic fields a source column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    WalkIns,
    TestDrives,
}

impl Field {
    /// Column name used in the cleaned table and in exports.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::WalkIns => "walk_ins",
            Field::TestDrives => "test_drives",
        }
    }
}

/// One inference rule: a header predicate and the field it maps to.
struct ColumnRule {
    field: Field,
    matches: fn(&str) -> bool,
}

fn is_date_header(header: &str) -> bool {
    header.contains("date")
}

fn is_walk_in_header(header: &str) -> bool {
    header.contains("walk")
}

fn is_test_drive_header(header: &str) -> bool {
    header.contains("test") && header.contains("drive")
}

/// Evaluated in order against the lowercased header; first match wins.
const RULES: [ColumnRule; 3] = [
    ColumnRule {
        field: Field::Date,
        matches: is_date_header,
    },
    ColumnRule {
        field: Field::WalkIns,
        matches: is_walk_in_header,
    },
    ColumnRule {
        field: Field::TestDrives,
        matches: is_test_drive_header,
    },
];

/// Typed mapping from semantic fields to source column indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: Option<usize>,
    pub walk_ins: Option<usize>,
    pub test_drives: Option<usize>,
    /// Source headers whose mapping was overwritten by a later column.
    pub shadowed: Vec<String>,
}

impl ColumnMapping {
    /// Infer the mapping from source headers.
    ///
    /// Headers are trimmed and matched case-insensitively. When several
    /// columns map to the same field the last one wins; the earlier headers
    /// are recorded in `shadowed`.
    pub fn infer(headers: &[String]) -> Self {
        let mut mapping = Self::default();

        for (idx, header) in headers.iter().enumerate() {
            let lower = header.trim().to_lowercase();
            let Some(rule) = RULES.iter().find(|rule| (rule.matches)(&lower)) else {
                continue;
            };

            if let Some(prev) = mapping.slot_mut(rule.field).replace(idx) {
                let prev_header = headers[prev].trim().to_string();
                warn!(
                    field = rule.field.name(),
                    shadowed = %prev_header,
                    winner = %header.trim(),
                    "multiple columns map to the same field; keeping the last one"
                );
                mapping.shadowed.push(prev_header);
            }
        }

        mapping
    }

    /// Source column index for a field.
    pub fn source(&self, field: Field) -> Option<usize> {
        match field {
            Field::Date => self.date,
            Field::WalkIns => self.walk_ins,
            Field::TestDrives => self.test_drives,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Date => &mut self.date,
            Field::WalkIns => &mut self.walk_ins,
            Field::TestDrives => &mut self.test_drives,
        }
    }

    /// Which semantic columns the cleaned table will carry.
    pub fn column_set(&self) -> ColumnSet {
        ColumnSet {
            date: self.date.is_some(),
            walk_ins: self.walk_ins.is_some(),
            test_drives: self.test_drives.is_some(),
        }
    }

    /// True when no source column matched any rule.
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.walk_ins.is_none() && self.test_drives.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_infers_loose_headers() {
        let mapping = ColumnMapping::infer(&headers(&["Visit Date", "Walk-ins", "Test-Drive Count"]));
        assert_eq!(mapping.date, Some(0));
        assert_eq!(mapping.walk_ins, Some(1));
        assert_eq!(mapping.test_drives, Some(2));
        assert!(mapping.shadowed.is_empty());
    }

    #[test]
    fn test_unmatched_columns_are_dropped() {
        let mapping = ColumnMapping::infer(&headers(&["Branch", "WALK IN CUSTOMER", "Notes"]));
        assert_eq!(mapping.date, None);
        assert_eq!(mapping.walk_ins, Some(1));
        assert_eq!(mapping.test_drives, None);
        assert_eq!(mapping.column_set(), ColumnSet { date: false, walk_ins: true, test_drives: false });
    }

    #[test]
    fn test_first_rule_wins_within_a_header() {
        // "date" is checked before "test"+"drive"
        let mapping = ColumnMapping::infer(&headers(&["Test Drive Date"]));
        assert_eq!(mapping.date, Some(0));
        assert_eq!(mapping.test_drives, None);
    }

    #[test]
    fn test_test_without_drive_is_ignored() {
        let mapping = ColumnMapping::infer(&headers(&["Test Count", "Drive Count"]));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_last_column_wins_and_is_reported() {
        let mapping = ColumnMapping::infer(&headers(&[" Walk-ins (AM) ", "Date", "Walk-ins (PM)"]));
        assert_eq!(mapping.walk_ins, Some(2));
        assert_eq!(mapping.shadowed, vec!["Walk-ins (AM)".to_string()]);
    }
}
