//! MirrorChart - yearly continent statistics as mirrored bar charts
//!
//! A CLI tool that counts records per year across a directory of category
//! spreadsheets and draws two such tables as a back-to-back stacked bar
//! chart.
//!
//! Failures are reported on stderr; the process always exits with status 0.

mod analysis;
mod chart;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;
mod workbook;

use analysis::{Aggregation, Aggregator};
use anyhow::{Context, Result};
use cli::{AggregateArgs, Args, Command, OutputFormat, RenderArgs};
use config::{Config, CONFIG_FILE};
use scanner::{CategoryScanner, ScanConfig};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return;
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
        }
        return;
    }

    init_logging(&args);

    info!("MirrorChart v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
    }
}

/// Handle init-config: generate a default .mirrorchart.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        return Ok(());
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the continent mapping, colors, ticks, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, merge and validate configuration, then dispatch the subcommand.
fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    match &args.command {
        Command::Aggregate(aggregate) => handle_aggregate(aggregate, &config, args.quiet),
        Command::Render(render) => handle_render(render, &config),
        Command::Run(_) => handle_pipeline(&config, args.quiet),
        Command::InitConfig => Ok(()),
    }
}

fn handle_aggregate(aggregate: &AggregateArgs, config: &Config, quiet: bool) -> Result<()> {
    let start_time = Instant::now();

    println!("📊 Aggregating {}", aggregate.input.display());
    let aggregation = aggregate_dir(&aggregate.input, &aggregate.output, config, quiet)?;

    if let Some(ref report_path) = aggregate.report {
        let duration = start_time.elapsed().as_secs_f64();
        let report = report::build_report(
            &aggregation,
            &aggregate.input,
            &aggregate.output,
            duration,
        );
        let output = match aggregate.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };

        std::fs::write(report_path, &output)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        println!("📝 Report saved to: {}", report_path.display());
    }

    Ok(())
}

fn handle_render(render: &RenderArgs, config: &Config) -> Result<()> {
    println!("🎨 Rendering mirror chart...");
    let layout =
        chart::render_tables(&render.table_a, &render.table_b, &render.output, config)?;

    println!(
        "   Years: {} | Peak total: {}",
        layout.years.len(),
        layout.max_total
    );
    println!("\n✅ Chart saved to: {}", render.output.display());
    Ok(())
}

/// Aggregate both datasets and render them, using the `[paths]` settings.
fn handle_pipeline(config: &Config, quiet: bool) -> Result<()> {
    let paths = &config.paths;

    println!("📊 Aggregating dataset A: {}", paths.dataset_a.display());
    aggregate_dir(&paths.dataset_a, &paths.table_a, config, quiet)?;

    println!("📊 Aggregating dataset B: {}", paths.dataset_b.display());
    aggregate_dir(&paths.dataset_b, &paths.table_b, config, quiet)?;

    println!("🎨 Rendering mirror chart...");
    chart::render_tables(&paths.table_a, &paths.table_b, &paths.chart, config)?;

    println!("\n✅ Chart saved to: {}", paths.chart.display());
    Ok(())
}

fn aggregate_dir(
    input: &Path,
    output: &Path,
    config: &Config,
    quiet: bool,
) -> Result<Aggregation> {
    let scan_config = ScanConfig::from(&config.aggregate);
    let scanner = CategoryScanner::new(input.to_path_buf(), scan_config);
    let aggregator = Aggregator::new(scanner, !quiet);

    let aggregation = aggregator
        .aggregate_to(output, &config.aggregate.sheet_name)
        .with_context(|| format!("Failed to aggregate {}", input.display()))?;

    println!(
        "   {} categories, {} years",
        aggregation.table.columns().len(),
        aggregation.table.years().len()
    );
    println!("✅ Table saved to: {}", output.display());
    Ok(aggregation)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
