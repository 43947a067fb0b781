//! Workbook reading.
//!
//! Two shapes are read: headerless label sheets (category files) and
//! year-indexed count tables with a header row (aggregated tables).

use crate::error::TableError;
use crate::models::YearCountTable;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// Open a workbook and return its first worksheet.
fn first_sheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TableError::NoWorksheet)
        .with_context(|| format!("Failed to read workbook: {}", path.display()))?
        .with_context(|| format!("Failed to read first sheet of {}", path.display()))?;

    debug!(
        "Read {} rows x {} columns from {}",
        range.height(),
        range.width(),
        path.display()
    );
    Ok(range)
}

/// Read the first-column labels of a headerless sheet, one entry per row.
pub fn read_labels(path: &Path) -> Result<Vec<Option<String>>> {
    let range = first_sheet(path)?;
    Ok(labels_from_range(&range))
}

/// Read an aggregated table: header row of column names, years down column A.
pub fn read_year_table(path: &Path) -> Result<YearCountTable> {
    let range = first_sheet(path)?;
    table_from_range(&range)
        .with_context(|| format!("Invalid count table: {}", path.display()))
}

pub(crate) fn labels_from_range(range: &Range<Data>) -> Vec<Option<String>> {
    // The range starts at the first non-empty cell; if that is not in
    // column A, the label column is blank.
    match range.start() {
        Some((_, 0)) => range
            .rows()
            .map(|row| row.first().and_then(cell_text))
            .collect(),
        Some(_) => vec![None; range.height()],
        None => Vec::new(),
    }
}

pub(crate) fn table_from_range(range: &Range<Data>) -> Result<YearCountTable, TableError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(YearCountTable::default());
    };

    let columns: Vec<String> = header
        .iter()
        .skip(1)
        .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
        .collect();

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut parsed = Vec::new();
    for (offset, row) in rows.enumerate() {
        // 1-based sheet row number for error messages
        let sheet_row = first_row + offset + 2;
        let year_cell = row.first().unwrap_or(&Data::Empty);
        let year = parse_year(year_cell).ok_or_else(|| TableError::InvalidYear {
            row: sheet_row,
            value: cell_text(year_cell).unwrap_or_default(),
        })?;

        let counts = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let cell = row.get(i + 1).unwrap_or(&Data::Empty);
                parse_count(cell).ok_or_else(|| TableError::InvalidCount {
                    row: sheet_row,
                    column: column.clone(),
                    value: cell_text(cell).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;

        parsed.push((year, counts));
    }

    YearCountTable::from_rows(columns, parsed)
}

/// Text of a cell the way a label column reads it.
///
/// Integral floats print without a fractional part so `2020.0` reads as
/// `2020`. Empty, boolean, error and date cells have no text.
pub(crate) fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(match whole_number(*f) {
            Some(i) => i.to_string(),
            None => f.to_string(),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        _ => None,
    }
}

fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
}

fn parse_year(cell: &Data) -> Option<u32> {
    match cell {
        Data::Int(i) => u32::try_from(*i).ok(),
        Data::Float(f) => whole_number(*f).and_then(|i| u32::try_from(i).ok()),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_count(cell: &Data) -> Option<u64> {
    match cell {
        Data::Empty => Some(0),
        Data::Int(i) => u64::try_from(*i).ok(),
        Data::Float(f) => whole_number(*f).and_then(|i| u64::try_from(i).ok()),
        Data::String(s) if s.trim().is_empty() => Some(0),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
