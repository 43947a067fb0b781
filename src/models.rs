//! Data models shared by the aggregator and the chart renderer.
//!
//! This module contains the count tables, the continent enumeration with its
//! versioned source-label mapping, and the color palette.

use crate::error::{ConfigError, TableError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The six continents, in canonical legend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continent {
    Asia,
    NorthAmerica,
    SouthAmerica,
    Oceania,
    Europe,
    Africa,
}

impl Continent {
    /// All continents in canonical order.
    pub const ALL: [Continent; 6] = [
        Continent::Asia,
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Oceania,
        Continent::Europe,
        Continent::Africa,
    ];

    /// Number of continents.
    pub const COUNT: usize = 6;

    /// Position in canonical order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Label used in the legend.
    pub fn display_name(self) -> &'static str {
        match self {
            Continent::Asia => "Asia",
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Oceania => "Oceania",
            Continent::Europe => "Europe",
            Continent::Africa => "Africa",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Mapping from source-language column labels to continents.
///
/// Validated on construction: exactly one source label per continent.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentMapping {
    version: u32,
    entries: Vec<(String, Continent)>,
}

impl ContinentMapping {
    /// The only mapping layout this build understands.
    pub const VERSION: u32 = 1;

    /// Build and validate a mapping.
    pub fn new(version: u32, entries: Vec<(String, Continent)>) -> Result<Self, ConfigError> {
        if version != Self::VERSION {
            return Err(ConfigError::UnsupportedMappingVersion(version));
        }
        if entries.len() != Continent::COUNT {
            return Err(ConfigError::MappingSize(entries.len()));
        }

        let mut labels = HashSet::new();
        let mut seen = [false; Continent::COUNT];
        for (label, continent) in &entries {
            if !labels.insert(label.as_str()) {
                return Err(ConfigError::DuplicateSourceLabel(label.clone()));
            }
            if std::mem::replace(&mut seen[continent.index()], true) {
                return Err(ConfigError::DuplicateContinent(continent.to_string()));
            }
        }
        if let Some(missing) = Continent::ALL.iter().find(|c| !seen[c.index()]) {
            return Err(ConfigError::MissingContinent(missing.to_string()));
        }

        Ok(Self { version, entries })
    }

    /// Mapping version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up the continent for a source label.
    pub fn lookup(&self, label: &str) -> Option<Continent> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|(source, _)| source == label)
            .map(|(_, continent)| *continent)
    }

    /// Source label for a continent.
    pub fn source_label(&self, continent: Continent) -> &str {
        self.entries
            .iter()
            .find(|(_, c)| *c == continent)
            .map(|(label, _)| label.as_str())
            .unwrap_or_default()
    }
}

impl Default for ContinentMapping {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            entries: vec![
                ("亚洲".to_string(), Continent::Asia),
                ("北美洲".to_string(), Continent::NorthAmerica),
                ("南美洲".to_string(), Continent::SouthAmerica),
                ("大洋洲".to_string(), Continent::Oceania),
                ("欧洲".to_string(), Continent::Europe),
                ("非洲".to_string(), Continent::Africa),
            ],
        }
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB`.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// One color per continent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette([Rgb; Continent::COUNT]);

impl Palette {
    pub fn new(colors: [Rgb; Continent::COUNT]) -> Self {
        Self(colors)
    }

    /// Color for a continent. Legend and bars both go through here.
    pub fn color(&self, continent: Continent) -> Rgb {
        self.0[continent.index()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self([
            Rgb(0xF2, 0x8E, 0x2B),
            Rgb(0x4E, 0x79, 0xA7),
            Rgb(0xED, 0xC9, 0x48),
            Rgb(0x59, 0xA1, 0x4F),
            Rgb(0x76, 0xB7, 0xB2),
            Rgb(0xE1, 0x57, 0x59),
        ])
    }
}

/// Yearly counts per category.
///
/// Rows are sorted ascending by year; every (year, column) cell is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearCountTable {
    years: Vec<u32>,
    columns: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl YearCountTable {
    /// Build a table from per-category tallies.
    ///
    /// Rows are the union of all years; absent cells are 0. Columns follow
    /// the map's (lexicographic) key order.
    pub fn from_tallies(tallies: &BTreeMap<String, BTreeMap<u32, u64>>) -> Self {
        let mut years: Vec<u32> = tallies
            .values()
            .flat_map(|counts| counts.keys().copied())
            .collect();
        years.sort_unstable();
        years.dedup();

        let columns: Vec<String> = tallies.keys().cloned().collect();
        let counts = years
            .iter()
            .map(|year| {
                tallies
                    .values()
                    .map(|per_year| per_year.get(year).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self {
            years,
            columns,
            counts,
        }
    }

    /// Build a table from loaded rows. Rows are sorted by year.
    pub fn from_rows(
        columns: Vec<String>,
        mut rows: Vec<(u32, Vec<u64>)>,
    ) -> Result<Self, TableError> {
        rows.sort_by_key(|(year, _)| *year);
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(TableError::DuplicateYear(pair[0].0));
        }

        let width = columns.len();
        let (years, counts) = rows
            .into_iter()
            .map(|(year, mut cells)| {
                cells.resize(width, 0);
                (year, cells)
            })
            .unzip();

        Ok(Self {
            years,
            columns,
            counts,
        })
    }

    pub fn years(&self) -> &[u32] {
        &self.years
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Counts for row `index`, in column order.
    pub fn row(&self, index: usize) -> &[u64] {
        &self.counts[index]
    }

    /// Count for a (year, column) pair, if both exist.
    #[cfg(test)]
    pub fn get(&self, year: u32, column: &str) -> Option<u64> {
        let row = self.years.binary_search(&year).ok()?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.counts[row][col])
    }

    /// All counts of one column, in year order.
    pub fn column_values(&self, column: &str) -> Option<Vec<u64>> {
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.counts.iter().map(|row| row[col]).collect())
    }

    /// Sum of a column over all years.
    pub fn column_total(&self, column: &str) -> u64 {
        self.column_values(column)
            .map(|values| values.iter().sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Yearly counts with exactly one column per continent, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinentTable {
    years: Vec<u32>,
    rows: Vec<[u64; Continent::COUNT]>,
}

impl ContinentTable {
    /// Relabel a count table's columns through the mapping.
    ///
    /// Every column must map to a distinct continent and every continent must
    /// be present; `name` identifies the table in errors.
    pub fn from_year_counts(
        name: &str,
        table: &YearCountTable,
        mapping: &ContinentMapping,
    ) -> Result<Self, TableError> {
        let mut slots: [Option<usize>; Continent::COUNT] = [None; Continent::COUNT];

        for (col, label) in table.columns().iter().enumerate() {
            let continent = mapping
                .lookup(label)
                .ok_or_else(|| TableError::UnknownContinent {
                    table: name.to_string(),
                    label: label.clone(),
                })?;
            if slots[continent.index()].replace(col).is_some() {
                return Err(TableError::DuplicateContinent {
                    table: name.to_string(),
                    continent: continent.to_string(),
                });
            }
        }

        let mut order = [0usize; Continent::COUNT];
        for continent in Continent::ALL {
            order[continent.index()] =
                slots[continent.index()].ok_or_else(|| TableError::MissingContinent {
                    table: name.to_string(),
                    continent: continent.to_string(),
                })?;
        }

        let rows = (0..table.years().len())
            .map(|i| {
                let source = table.row(i);
                order.map(|col| source[col])
            })
            .collect();

        Ok(Self {
            years: table.years().to_vec(),
            rows,
        })
    }

    /// Build directly from sorted years and canonical-order rows.
    #[cfg(test)]
    pub fn from_parts(years: Vec<u32>, rows: Vec<[u64; Continent::COUNT]>) -> Self {
        Self { years, rows }
    }

    /// Reindex onto `years`, filling absent rows with zeros.
    pub fn reindex(&self, years: &[u32]) -> Self {
        let rows = years
            .iter()
            .map(|year| match self.years.binary_search(year) {
                Ok(i) => self.rows[i],
                Err(_) => [0; Continent::COUNT],
            })
            .collect();

        Self {
            years: years.to_vec(),
            rows,
        }
    }

    pub fn years(&self) -> &[u32] {
        &self.years
    }

    pub fn rows(&self) -> &[[u64; Continent::COUNT]] {
        &self.rows
    }

    /// Sum over all continents for row `index`.
    pub fn row_total(&self, index: usize) -> u64 {
        self.rows[index].iter().sum()
    }

    /// Largest per-year total, 0 when empty.
    pub fn max_row_total(&self) -> u64 {
        (0..self.rows.len())
            .map(|i| self.row_total(i))
            .max()
            .unwrap_or(0)
    }
}

/// Per-category line of an aggregation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category name.
    pub name: String,
    /// Rows read from the file.
    pub rows: usize,
    /// Rows that produced a year.
    pub counted: u64,
    /// Rows without a trailing year.
    pub discarded: usize,
}

/// Metadata about an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Directory of category files.
    pub input_dir: String,
    /// Combined table written by the run.
    pub output_path: String,
    /// Duration of the aggregation in seconds.
    pub duration_seconds: f64,
}

/// Summary of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub metadata: ReportMetadata,
    /// First and last year present.
    pub year_range: Option<(u32, u32)>,
    pub categories: Vec<CategorySummary>,
    /// The combined table.
    pub table: YearCountTable,
}

impl AggregationReport {
    /// Rows discarded across all categories.
    pub fn discarded_total(&self) -> usize {
        self.categories.iter().map(|c| c.discarded).sum()
    }
}
