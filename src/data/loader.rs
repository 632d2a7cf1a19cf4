//! Spreadsheet Loader Module
//! Reads Excel workbooks with calamine and comma-separated sheets with
//! Polars, and memoizes the cleaned table by file content.

use crate::data::processor::{DataProcessor, LoadSummary, RawSheet};
use crate::data::DashboardTable;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Distinct file contents kept in the cache, most recent first.
const CACHE_CAPACITY: usize = 4;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] PolarsError),
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Workbook has no worksheets")]
    NoSheet,
}

/// Container format of a loaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// xlsx/xlsm/ods (zip) or legacy xls (OLE) workbook.
    Workbook,
    Csv,
}

impl SheetFormat {
    /// Detect the format from the leading bytes.
    pub fn detect(content: &[u8]) -> Self {
        if content.starts_with(ZIP_MAGIC) || content.starts_with(OLE_MAGIC) {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }
}

/// A cleaned table together with its load summary.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub table: DashboardTable,
    pub summary: LoadSummary,
}

struct CacheEntry {
    key: u64,
    content: Vec<u8>,
    loaded: Arc<LoadedData>,
}

/// Loads spreadsheets and caches results keyed by exact file content.
pub struct DataLoader {
    cache: VecDeque<CacheEntry>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            cache: VecDeque::with_capacity(CACHE_CAPACITY),
            file_path: None,
        }
    }

    /// Read and normalize a file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<LoadedData>, LoadError> {
        let content = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded = self.load_bytes(&content)?;
        self.file_path = Some(path.to_path_buf());
        info!(path = %path.display(), "{}", loaded.summary);
        Ok(loaded)
    }

    /// Normalize raw file content. Identical content is served from cache.
    pub fn load_bytes(&mut self, content: &[u8]) -> Result<Arc<LoadedData>, LoadError> {
        let key = Self::content_key(content);

        if let Some(pos) = self
            .cache
            .iter()
            .position(|entry| entry.key == key && entry.content == content)
        {
            debug!(bytes = content.len(), "content cache hit");
            if let Some(entry) = self.cache.remove(pos) {
                let loaded = Arc::clone(&entry.loaded);
                self.cache.push_front(entry);
                return Ok(loaded);
            }
        }

        let format = SheetFormat::detect(content);
        let sheet = match format {
            SheetFormat::Workbook => Self::parse_workbook(content)?,
            SheetFormat::Csv => Self::parse_sheet(content)?,
        };
        debug!(
            ?format,
            rows = sheet.height,
            columns = ?sheet.headers,
            "parsed sheet"
        );

        let (table, summary) = DataProcessor::normalize(&sheet);
        let loaded = Arc::new(LoadedData { table, summary });

        self.cache.push_front(CacheEntry {
            key,
            content: content.to_vec(),
            loaded: Arc::clone(&loaded),
        });
        self.cache.truncate(CACHE_CAPACITY);

        Ok(loaded)
    }

    /// Parse CSV content into string cells. Every column is read as text so
    /// coercion stays under the normalizer's control. Rows with extra
    /// trailing fields are truncated to the header width.
    pub fn parse_sheet(content: &[u8]) -> Result<RawSheet, LoadError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
            .into_reader_with_file_handle(Cursor::new(content.to_vec()))
            .finish()?;

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let columns = df
            .get_columns()
            .iter()
            .map(|column| {
                let series = column.as_materialized_series().cast(&DataType::String)?;
                let values = series
                    .str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect();
                Ok(values)
            })
            .collect::<PolarsResult<Vec<Vec<Option<String>>>>>()?;

        Ok(RawSheet {
            headers,
            columns,
            height: df.height(),
        })
    }

    /// Read the first worksheet of a workbook. The first row holds the
    /// headers; cells are rendered as text the normalizer understands.
    pub fn parse_workbook(content: &[u8]) -> Result<RawSheet, LoadError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;
        let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoSheet)??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|cell| Self::cell_text(cell).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut height = 0;
        for row in rows {
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(row.get(i).and_then(Self::cell_text));
            }
            height += 1;
        }

        Ok(RawSheet {
            headers,
            columns,
            height,
        })
    }

    /// Text form of a workbook cell. Date cells become `YYYY-MM-DD`, or
    /// `YYYY-MM-DD HH:MM:SS` when they carry a time of day.
    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) => Some(s.clone()),
            Data::Int(v) => Some(v.to_string()),
            Data::Float(v) => Some(v.to_string()),
            Data::Bool(v) => Some(v.to_string()),
            Data::DateTime(dt) => dt.as_datetime().map(|dt| {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        }
    }

    fn content_key(content: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish()
    }

    /// Number of distinct contents held in the cache.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Path of the last file loaded from disk.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use ::zip::write::FileOptions;
    use ::zip::ZipWriter;

    const SAMPLE: &str = "Visit Date,Walk-ins,Test-Drive Count,Notes\n\
                          2024-01-01,10,2,opening\n\
                          2024-01-02,0,5,\n\
                          2024-01-02,5,bad,rain\n";

    #[test]
    fn test_parse_sheet_reads_all_columns_as_text() {
        let sheet = DataLoader::parse_sheet(SAMPLE.as_bytes()).unwrap();
        assert_eq!(sheet.headers, vec!["Visit Date", "Walk-ins", "Test-Drive Count", "Notes"]);
        assert_eq!(sheet.height, 3);
        assert_eq!(sheet.columns[1][0].as_deref(), Some("10"));
        assert_eq!(sheet.columns[2][2].as_deref(), Some("bad"));
        assert_eq!(sheet.columns[3][1], None);
    }

    #[test]
    fn test_load_bytes_cleans_and_derives() {
        let mut loader = DataLoader::new();
        let loaded = loader.load_bytes(SAMPLE.as_bytes()).unwrap();

        assert_eq!(loaded.table.len(), 3);
        let rates: Vec<f64> = loaded
            .table
            .rows()
            .iter()
            .filter_map(|r| r.conversion_rate())
            .collect();
        assert_eq!(rates, vec![20.0, 0.0, 0.0]);
        assert_eq!(loaded.summary.coerced_test_drives, 1);
    }

    #[test]
    fn test_identical_content_is_served_from_cache() {
        let mut loader = DataLoader::new();
        let first = loader.load_bytes(SAMPLE.as_bytes()).unwrap();
        let second = loader.load_bytes(SAMPLE.as_bytes()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached_count(), 1);

        let other = format!("{SAMPLE}2024-01-03,4,1,\n");
        let third = loader.load_bytes(other.as_bytes()).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.table.len(), 4);
        assert_eq!(loader.cached_count(), 2);
    }

    #[test]
    fn test_header_only_file_is_empty_not_error() {
        let mut loader = DataLoader::new();
        let loaded = loader
            .load_bytes(b"Date,Walk-in Customer,Test Drive\n")
            .unwrap();
        assert!(loaded.table.is_empty());
        assert!(loaded.table.columns().has_conversion_rate());
    }

    #[test]
    fn test_empty_file_is_load_error() {
        let mut loader = DataLoader::new();
        assert!(matches!(loader.load_bytes(b""), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut loader = DataLoader::new();
        let err = loader
            .load_file(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(loader.get_file_path().is_none());
    }

    #[test]
    fn test_load_file_records_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let mut loader = DataLoader::new();
        let loaded = loader.load_file(file.path()).unwrap();
        assert_eq!(loaded.table.len(), 3);
        assert_eq!(loader.get_file_path(), Some(&file.path().to_path_buf()));
    }

    #[test]
    fn test_cache_keeps_most_recent_contents() {
        let mut loader = DataLoader::new();
        let first = loader.load_bytes(SAMPLE.as_bytes()).unwrap();
        for day in 3..3 + CACHE_CAPACITY {
            let other = format!("{SAMPLE}2024-01-{day:02},4,1,\n");
            loader.load_bytes(other.as_bytes()).unwrap();
        }
        assert_eq!(loader.cached_count(), CACHE_CAPACITY);

        // the oldest entry was evicted and is recomputed
        let again = loader.load_bytes(SAMPLE.as_bytes()).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(again.table.len(), 3);
        assert_eq!(loader.cached_count(), CACHE_CAPACITY);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let mut loader = DataLoader::new();
        let loaded = loader
            .load_bytes(b"Date,Walk-ins,Test Drive\n2024-01-01,10\n2024-01-02,1,1,extra\n")
            .unwrap();

        let rows = loaded.table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].walk_ins, Some(10));
        assert_eq!(rows[0].test_drives, Some(0));
        assert_eq!(rows[1].walk_ins, Some(1));
        assert_eq!(rows[1].test_drives, Some(1));
    }

    /// Cell of a minimal worksheet: inline text, plain number, or a number
    /// styled as a date.
    enum Cell<'a> {
        Text(&'a str),
        Number(f64),
        Date(f64),
    }

    fn cell_xml(reference: &str, cell: &Cell) -> String {
        match cell {
            Cell::Text(t) => format!(
                r#"<c r="{reference}" t="inlineStr"><is><t>{t}</t></is></c>"#
            ),
            Cell::Number(v) => format!(r#"<c r="{reference}"><v>{v}</v></c>"#),
            Cell::Date(v) => format!(r#"<c r="{reference}" s="1"><v>{v}</v></c>"#),
        }
    }

    fn xlsx_bytes(rows: &[Vec<Cell>]) -> Vec<u8> {
        let mut sheet_rows = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_rows.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                sheet_rows.push_str(&cell_xml(&reference, cell));
            }
            sheet_rows.push_str("</row>");
        }

        let files = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
                    .to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/styles.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_rows}</sheetData></worksheet>"#
                ),
            ),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_workbook_dates_and_numbers() {
        // 45292 is 2024-01-01 as an Excel serial date
        let bytes = xlsx_bytes(&[
            vec![Cell::Text("Visit Date"), Cell::Text("Walk-ins"), Cell::Text("Test-Drive Count")],
            vec![Cell::Date(45292.0), Cell::Number(10.0), Cell::Number(2.0)],
            vec![Cell::Date(45293.0), Cell::Number(0.0), Cell::Number(5.0)],
            vec![Cell::Date(45293.0), Cell::Number(5.0), Cell::Text("bad")],
        ]);
        assert_eq!(SheetFormat::detect(&bytes), SheetFormat::Workbook);

        let sheet = DataLoader::parse_workbook(&bytes).unwrap();
        assert_eq!(sheet.headers, vec!["Visit Date", "Walk-ins", "Test-Drive Count"]);
        assert_eq!(sheet.height, 3);
        assert_eq!(sheet.columns[0][0].as_deref(), Some("2024-01-01"));
        assert_eq!(sheet.columns[1][0].as_deref(), Some("10"));

        let mut loader = DataLoader::new();
        let loaded = loader.load_bytes(&bytes).unwrap();
        let rows = loaded.table.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 2));
        let rates: Vec<f64> = rows.iter().filter_map(|r| r.conversion_rate()).collect();
        assert_eq!(rates, vec![20.0, 0.0, 0.0]);
        assert_eq!(loaded.summary.coerced_test_drives, 1);
    }

    #[test]
    fn test_csv_is_detected_as_csv() {
        assert_eq!(SheetFormat::detect(SAMPLE.as_bytes()), SheetFormat::Csv);
    }

    #[test]
    fn test_corrupt_workbook_is_load_error() {
        let mut loader = DataLoader::new();
        let err = loader.load_bytes(b"PK\x03\x04 not really a zip").unwrap_err();
        assert!(matches!(err, LoadError::Workbook(_)));
    }
}
