//! Alignment of two continent tables onto one shared year index.

use crate::error::TableError;
use crate::models::{ContinentMapping, ContinentTable};
use crate::workbook;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Two continent tables sharing the same sorted years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub a: ContinentTable,
    pub b: ContinentTable,
}

impl AlignedPair {
    /// Shared years, ascending.
    pub fn years(&self) -> &[u32] {
        self.a.years()
    }

    /// Largest per-year total over both tables.
    pub fn max_total(&self) -> u64 {
        self.a.max_row_total().max(self.b.max_row_total())
    }
}

/// Sorted union of two year lists.
pub fn union_years(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut years: Vec<u32> = a.iter().chain(b).copied().collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Reindex both tables onto the union of their years.
pub fn align(a: &ContinentTable, b: &ContinentTable) -> Result<AlignedPair, TableError> {
    let years = union_years(a.years(), b.years());
    if years.is_empty() {
        return Err(TableError::Empty);
    }

    Ok(AlignedPair {
        a: a.reindex(&years),
        b: b.reindex(&years),
    })
}

/// Load two aggregated tables, relabel their columns and align them.
pub fn load_aligned(
    path_a: &Path,
    path_b: &Path,
    mapping: &ContinentMapping,
) -> Result<AlignedPair> {
    let a = load_continent_table(path_a, mapping)?;
    let b = load_continent_table(path_b, mapping)?;

    let pair = align(&a, &b)?;
    info!(
        "Aligned {} years ({} in A, {} in B)",
        pair.years().len(),
        a.years().len(),
        b.years().len()
    );
    Ok(pair)
}

fn load_continent_table(path: &Path, mapping: &ContinentMapping) -> Result<ContinentTable> {
    let table = workbook::read_year_table(path)?;
    debug!("{}: columns {:?}", path.display(), table.columns());

    let name = path.display().to_string();
    ContinentTable::from_year_counts(&name, &table, mapping)
        .with_context(|| format!("Column mismatch in {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_years() {
        assert_eq!(union_years(&[2019, 2021], &[2020, 2021]), vec![2019, 2020, 2021]);
        assert_eq!(union_years(&[], &[]), Vec::<u32>::new());
    }

    #[test]
    fn test_align_fills_missing_years() {
        let a = ContinentTable::from_parts(vec![2019, 2021], vec![[1; 6], [2; 6]]);
        let b = ContinentTable::from_parts(vec![2020], vec![[3; 6]]);

        let pair = align(&a, &b).unwrap();
        assert_eq!(pair.years(), &[2019, 2020, 2021]);
        assert_eq!(pair.b.years(), &[2019, 2020, 2021]);
        assert_eq!(pair.a.rows()[1], [0; 6]);
        assert_eq!(pair.b.rows()[0], [0; 6]);
        assert_eq!(pair.b.rows()[1], [3; 6]);
        assert_eq!(pair.max_total(), 18);
    }

    #[test]
    fn test_align_is_idempotent() {
        let a = ContinentTable::from_parts(vec![2018, 2021], vec![[1, 0, 0, 0, 0, 2], [0; 6]]);
        let b = ContinentTable::from_parts(vec![2020], vec![[0, 4, 0, 0, 0, 0]]);

        let once = align(&a, &b).unwrap();
        let twice = align(&once.a, &once.b).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_align_empty() {
        let empty = ContinentTable::default();
        assert!(matches!(align(&empty, &empty), Err(TableError::Empty)));
    }
}
