//! Aggregation report generation.
//!
//! This module renders a summary of an aggregation run as Markdown or JSON.

use crate::analysis::Aggregation;
use crate::models::{AggregationReport, CategorySummary, ReportMetadata, YearCountTable};
use anyhow::Result;
use chrono::Utc;
use std::path::Path;

/// Build a report from an aggregation run.
pub fn build_report(
    aggregation: &Aggregation,
    input_dir: &Path,
    output_path: &Path,
    duration_seconds: f64,
) -> AggregationReport {
    let years = aggregation.table.years();
    let year_range = years.first().zip(years.last()).map(|(a, b)| (*a, *b));

    AggregationReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            input_dir: input_dir.display().to_string(),
            output_path: output_path.display().to_string(),
            duration_seconds,
        },
        year_range,
        categories: aggregation
            .categories
            .iter()
            .map(|c| CategorySummary {
                name: c.name.clone(),
                rows: c.rows,
                counted: c.counted(),
                discarded: c.discarded,
            })
            .collect(),
        table: aggregation.table.clone(),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AggregationReport) -> String {
    let mut output = String::new();

    output.push_str("# Yearly Statistics Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_categories_section(&report.categories));
    output.push_str(&generate_table_section(&report.table));

    output
}

fn generate_metadata_section(report: &AggregationReport) -> String {
    let metadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Input Directory:** `{}`\n", metadata.input_dir));
    section.push_str(&format!("- **Output Table:** `{}`\n", metadata.output_path));
    section.push_str(&format!("- **Categories:** {}\n", report.categories.len()));
    match report.year_range {
        Some((first, last)) => section.push_str(&format!(
            "- **Years:** {} ({} to {})\n",
            report.table.years().len(),
            first,
            last
        )),
        None => section.push_str("- **Years:** none\n"),
    }
    let discarded = report.discarded_total();
    if discarded > 0 {
        section.push_str(&format!("- **Rows Discarded:** {}\n", discarded));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_categories_section(categories: &[CategorySummary]) -> String {
    let mut section = String::new();

    section.push_str("## Categories\n\n");
    if categories.is_empty() {
        section.push_str("No category files were found.\n\n");
        return section;
    }

    section.push_str("| Category | Rows | Counted | Discarded |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for category in categories {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            category.name, category.rows, category.counted, category.discarded
        ));
    }
    section.push('\n');

    section
}

fn generate_table_section(table: &YearCountTable) -> String {
    let mut section = String::new();

    section.push_str("## Counts by Year\n\n");
    if table.is_empty() {
        section.push_str("No years were extracted.\n");
        return section;
    }

    section.push_str("| Year |");
    for column in table.columns() {
        section.push_str(&format!(" {} |", column));
    }
    section.push_str("\n|:---|");
    section.push_str(&"---:|".repeat(table.columns().len()));
    section.push('\n');

    for (i, year) in table.years().iter().enumerate() {
        section.push_str(&format!("| {} |", year));
        for count in table.row(i) {
            section.push_str(&format!(" {} |", count));
        }
        section.push('\n');
    }

    section.push_str("| **Total** |");
    for column in table.columns() {
        section.push_str(&format!(" **{}** |", table.column_total(column)));
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AggregationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
