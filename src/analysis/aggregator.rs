//! Yearly count aggregation.
//!
//! Each category file contributes one column: the number of rows whose label
//! ends in a given four-digit year. Labels without a trailing year are
//! discarded and counted.

use crate::models::YearCountTable;
use crate::scanner::{CategoryFile, CategoryScanner};
use crate::workbook;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

static YEAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})$").expect("year pattern is valid"));

/// Extract the trailing four-digit year of a label.
///
/// Only ASCII digits form a year; full-width and other script digits do not.
pub fn extract_year(label: &str) -> Option<u32> {
    let label = label.strip_suffix('\n').unwrap_or(label);
    YEAR_SUFFIX
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Per-category tally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryTally {
    /// Category name.
    pub name: String,
    /// Rows per year.
    pub counts: BTreeMap<u32, u64>,
    /// Rows read from the file.
    pub rows: usize,
    /// Rows without a trailing year.
    pub discarded: usize,
}

impl CategoryTally {
    /// Rows that produced a year.
    pub fn counted(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Count the years in a column of labels.
pub fn tally_labels(name: &str, labels: &[Option<String>]) -> CategoryTally {
    let mut tally = CategoryTally {
        name: name.to_string(),
        rows: labels.len(),
        ..Default::default()
    };

    for (row, label) in labels.iter().enumerate() {
        match label.as_deref().and_then(extract_year) {
            Some(year) => *tally.counts.entry(year).or_insert(0) += 1,
            None => {
                debug!("{}: row {} has no trailing year: {:?}", name, row + 1, label);
                tally.discarded += 1;
            }
        }
    }

    tally
}

/// Result of aggregating one directory.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Combined year-by-category table.
    pub table: YearCountTable,
    /// Per-category details, sorted by name.
    pub categories: Vec<CategoryTally>,
}

impl Aggregation {
    /// Combine per-category tallies into one table.
    pub fn from_tallies(mut categories: Vec<CategoryTally>) -> Self {
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        let counts: BTreeMap<String, BTreeMap<u32, u64>> = categories
            .iter()
            .map(|c| (c.name.clone(), c.counts.clone()))
            .collect();

        Self {
            table: YearCountTable::from_tallies(&counts),
            categories,
        }
    }

    /// Rows discarded across all categories.
    pub fn discarded_total(&self) -> usize {
        self.categories.iter().map(|c| c.discarded).sum()
    }
}

/// Aggregates a directory of category files.
pub struct Aggregator {
    scanner: CategoryScanner,
    show_progress: bool,
}

impl Aggregator {
    pub fn new(scanner: CategoryScanner, show_progress: bool) -> Self {
        Self {
            scanner,
            show_progress,
        }
    }

    /// Read and tally every category file.
    pub fn aggregate(&self) -> Result<Aggregation> {
        let files = self.scanner.scan()?;
        if files.is_empty() {
            warn!("No category files in {}", self.scanner.root().display());
        }

        let progress = self.progress_bar(files.len() as u64);
        let mut tallies = Vec::with_capacity(files.len());
        for file in &files {
            progress.set_message(file.name.clone());
            tallies.push(tally_file(file)?);
            progress.inc(1);
        }
        progress.finish_and_clear();

        let aggregation = Aggregation::from_tallies(tallies);
        let discarded = aggregation.discarded_total();
        if discarded > 0 {
            warn!(
                "Discarded {} rows without a trailing year in {}",
                discarded,
                self.scanner.root().display()
            );
        }
        info!(
            "Aggregated {} categories over {} years",
            aggregation.table.columns().len(),
            aggregation.table.years().len()
        );

        Ok(aggregation)
    }

    /// Aggregate and write the combined table to `output`.
    pub fn aggregate_to(&self, output: &Path, sheet_name: &str) -> Result<Aggregation> {
        let aggregation = self.aggregate()?;
        workbook::write_year_table(&aggregation.table, sheet_name, output)?;
        Ok(aggregation)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn tally_file(file: &CategoryFile) -> Result<CategoryTally> {
    debug!("Reading {} ({} bytes)", file.path.display(), file.size);
    let labels = workbook::read_labels(&file.path)
        .with_context(|| format!("Failed to read category {}", file.name))?;
    let tally = tally_labels(&file.name, &labels);
    debug!(
        "{}: {} rows, {} counted, {} discarded",
        file.name,
        tally.rows,
        tally.counted(),
        tally.discarded
    );
    Ok(tally)
}
