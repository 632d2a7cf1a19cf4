//! Data module - spreadsheet loading, column inference and cleaning

mod loader;
mod processor;
mod schema;
mod table;

pub use loader::{DataLoader, LoadError, LoadedData, SheetFormat};
pub use processor::{parse_count, parse_date, DataProcessor, LoadSummary, RawSheet};
pub use schema::{ColumnMapping, Field};
pub use table::{conversion_rate, ColumnSet, DashboardTable, DateRange, Record};
