//! Workbook writing.

use crate::models::YearCountTable;
use anyhow::{bail, Context, Result};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};
use std::path::Path;
use tracing::debug;

const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

/// Write a count table as an index-style sheet.
///
/// A1 is left empty, column names run along row 1 from B1, years run down
/// column A from A2.
pub fn write_year_table(table: &YearCountTable, sheet_name: &str, path: &Path) -> Result<()> {
    if table.columns().len() + 1 > MAX_COLUMNS {
        bail!("Too many categories for one sheet: {}", table.columns().len());
    }
    if table.years().len() + 1 > MAX_ROWS {
        bail!("Too many years for one sheet: {}", table.years().len());
    }

    let mut workbook = build_workbook(table, sheet_name)
        .with_context(|| format!("Failed to build sheet {:?}", sheet_name))?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to write table to {}", path.display()))?;

    debug!(
        "Wrote {} years x {} categories to {}",
        table.years().len(),
        table.columns().len(),
        path.display()
    );
    Ok(())
}

fn build_workbook(table: &YearCountTable, sheet_name: &str) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (i, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, (i + 1) as ColNum, column, &header)?;
    }

    for (r, year) in table.years().iter().enumerate() {
        let row = (r + 1) as RowNum;
        worksheet.write_number_with_format(row, 0, *year, &header)?;
        for (c, count) in table.row(r).iter().enumerate() {
            worksheet.write_number(row, (c + 1) as ColNum, *count as f64)?;
        }
    }

    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::read_year_table;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_written_table_reads_back() {
        let mut tallies: BTreeMap<String, BTreeMap<u32, u64>> = BTreeMap::new();
        tallies.insert("A".into(), [(2020, 2), (2021, 1)].into_iter().collect());
        tallies.insert("B".into(), [(2021, 1)].into_iter().collect());
        let table = YearCountTable::from_tallies(&tallies);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.xlsx");
        write_year_table(&table, "Yearly Statistics", &path).unwrap();

        assert_eq!(read_year_table(&path).unwrap(), table);
    }

    #[test]
    fn test_invalid_sheet_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.xlsx");
        let result = write_year_table(&YearCountTable::default(), "bad[name]", &path);
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
