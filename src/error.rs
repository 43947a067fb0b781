//! Error types for table handling, configuration and rendering.
//!
//! Application code wraps these in `anyhow` with file context; the enums
//! exist so the failure kinds stay distinguishable in tests.

use thiserror::Error;

/// Errors raised while reading or reshaping count tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// A year cell could not be interpreted as a year.
    #[error("Invalid year at row {row}: {value:?}")]
    InvalidYear { row: usize, value: String },

    /// A count cell was negative, fractional or not numeric.
    #[error("Invalid count at row {row}, column {column:?}: {value:?}")]
    InvalidCount {
        row: usize,
        column: String,
        value: String,
    },

    /// The same year appears twice in one table.
    #[error("Duplicate year {0} in table")]
    DuplicateYear(u32),

    /// A column label has no entry in the continent mapping.
    #[error("Table {table}: column {label:?} is not a known continent label")]
    UnknownContinent { table: String, label: String },

    /// Two columns map to the same continent.
    #[error("Table {table}: continent {continent} appears more than once")]
    DuplicateContinent { table: String, continent: String },

    /// A continent is missing from the table.
    #[error("Table {table}: missing column for continent {continent}")]
    MissingContinent { table: String, continent: String },

    /// The workbook has no worksheet to read.
    #[error("Workbook has no worksheets")]
    NoWorksheet,

    /// Nothing to plot after alignment.
    #[error("Both tables are empty; there are no years to plot")]
    Empty,
}

/// Errors raised while validating configuration.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported continent mapping version {0} (expected 1)")]
    UnsupportedMappingVersion(u32),

    #[error("Continent mapping must have exactly 6 entries, found {0}")]
    MappingSize(usize),

    #[error("Continent {0} is mapped more than once")]
    DuplicateContinent(String),

    #[error("Source label {0:?} is mapped more than once")]
    DuplicateSourceLabel(String),

    #[error("Continent {0} has no mapping entry")]
    MissingContinent(String),

    #[error("Invalid color {0:?} (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("Invalid chart setting: {0}")]
    InvalidChart(String),
}

/// Errors raised while drawing or encoding the chart.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Unsupported image format for {0}")]
    UnsupportedFormat(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to load font {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("Image size {width}x{height} is too large")]
    TooLarge { width: u64, height: u64 },
}
