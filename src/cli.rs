//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// MirrorChart - yearly continent statistics as mirrored bar charts
///
/// Count records per year in a folder of spreadsheets and compare two
/// datasets in a back-to-back stacked bar chart.
///
/// Examples:
///   mirrorchart aggregate --input data/A --output A-Yearly_Statistics.xlsx
///   mirrorchart render --table-a A-Yearly_Statistics.xlsx --table-b B-Yearly_Statistics.xlsx --output plot.png
///   mirrorchart run --dataset-a data/A --dataset-b data/B --output plot.tiff
///   mirrorchart init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mirrorchart.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE", env = "MIRRORCHART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Count rows per year in every category file of a directory
    Aggregate(AggregateArgs),

    /// Draw the mirror chart from two aggregated tables
    Render(RenderArgs),

    /// Aggregate both datasets and draw the chart
    Run(RunArgs),

    /// Generate a default .mirrorchart.toml configuration file
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AggregateArgs {
    /// Directory of category spreadsheets
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Output spreadsheet for the combined table
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Also write a summary report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenderArgs {
    /// Aggregated table for the left (mirrored) panel
    #[arg(long, value_name = "FILE")]
    pub table_a: PathBuf,

    /// Aggregated table for the right panel
    #[arg(long, value_name = "FILE")]
    pub table_b: PathBuf,

    /// Output image (.png, .tif/.tiff or .svg)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output resolution in dots per inch
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Highest tick mark
    #[arg(long, value_name = "COUNT")]
    pub tick_ceiling: Option<u64>,

    /// Distance between tick marks
    #[arg(long, value_name = "COUNT")]
    pub tick_step: Option<u64>,

    /// TrueType font for chart text
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Directory of dataset A's category files
    #[arg(long, value_name = "DIR")]
    pub dataset_a: Option<PathBuf>,

    /// Directory of dataset B's category files
    #[arg(long, value_name = "DIR")]
    pub dataset_b: Option<PathBuf>,

    /// Output image
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output resolution in dots per inch
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,
}

/// Output format for the aggregation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Aggregate(args) => {
                check_dir(&args.input)?;
            }
            Command::Render(args) => {
                check_file(&args.table_a)?;
                check_file(&args.table_b)?;
                if args.dpi == Some(0) {
                    return Err("DPI must be at least 1".to_string());
                }
                if args.tick_step == Some(0) {
                    return Err("Tick step must be at least 1".to_string());
                }
            }
            Command::Run(args) => {
                for dir in [&args.dataset_a, &args.dataset_b].into_iter().flatten() {
                    check_dir(dir)?;
                }
                if args.dpi == Some(0) {
                    return Err("DPI must be at least 1".to_string());
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn check_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", path.display()));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", path.display()));
    }
    Ok(())
}

fn check_file(path: &Path) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("File does not exist: {}", path.display()));
    }
    Ok(())
}
