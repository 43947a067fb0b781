//! Spreadsheet reading and writing.
//!
//! Reading goes through calamine so any workbook format it detects is
//! accepted; tables are always written as `.xlsx`.

pub mod reader;
pub mod writer;

pub use reader::{read_labels, read_year_table};
pub use writer::write_year_table;
