//! CSV import of fault records and export of result tables.

pub mod export;
pub mod import;

pub use export::{export_estimates, export_filtered, write_estimates, write_filtered};
pub use import::{CsvFormat, ImportOutcome, import_records, read_records};
