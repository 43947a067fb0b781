//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.mirrorchart.toml` files.

use crate::cli::{Args, Command};
use crate::error::ConfigError;
use crate::models::{Continent, ContinentMapping, Palette, Rgb};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".mirrorchart.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Aggregation settings.
    #[serde(default)]
    pub aggregate: AggregateConfig,

    /// Chart geometry settings.
    #[serde(default)]
    pub chart: ChartConfig,

    /// Text styling.
    #[serde(default)]
    pub style: StyleConfig,

    /// Paths used by `run`.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Continent mapping and palette.
    #[serde(default)]
    pub continents: ContinentsConfig,
}

/// Aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// File extension (without dot) of category files.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Sheet name of the combined table.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            sheet_name: default_sheet_name(),
        }
    }
}

fn default_extension() -> String {
    "xlsx".to_string()
}

fn default_sheet_name() -> String {
    "Yearly Statistics".to_string()
}

/// Chart geometry and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Highest tick mark; also the anchor of the mirrored bars.
    #[serde(default = "default_tick_ceiling")]
    pub tick_ceiling: u64,

    /// Distance between tick marks.
    #[serde(default = "default_tick_step")]
    pub tick_step: u64,

    /// Bar thickness as a fraction of the row pitch.
    #[serde(default = "default_bar_height_fraction")]
    pub bar_height_fraction: f64,

    /// Output resolution.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Figure width in inches.
    #[serde(default = "default_width_inches")]
    pub width_inches: f64,

    /// Figure height in inches.
    #[serde(default = "default_height_inches")]
    pub height_inches: f64,

    /// Left panel axis limit as a multiple of the largest yearly total.
    #[serde(default = "default_left_padding")]
    pub left_padding: f64,

    /// Right panel axis limit as a multiple of the largest yearly total.
    #[serde(default = "default_right_padding")]
    pub right_padding: f64,

    /// Vertical space above the last row and below the first, in rows.
    #[serde(default = "default_row_margin")]
    pub row_margin: f64,

    /// Gap between the panels as a fraction of the panel width.
    #[serde(default = "default_panel_gap")]
    pub panel_gap: f64,

    /// Title above the left (mirrored) panel.
    #[serde(default = "default_left_title")]
    pub left_title: String,

    /// Title above the right panel.
    #[serde(default = "default_right_title")]
    pub right_title: String,

    /// Legend title.
    #[serde(default = "default_legend_title")]
    pub legend_title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            tick_ceiling: default_tick_ceiling(),
            tick_step: default_tick_step(),
            bar_height_fraction: default_bar_height_fraction(),
            dpi: default_dpi(),
            width_inches: default_width_inches(),
            height_inches: default_height_inches(),
            left_padding: default_left_padding(),
            right_padding: default_right_padding(),
            row_margin: default_row_margin(),
            panel_gap: default_panel_gap(),
            left_title: default_left_title(),
            right_title: default_right_title(),
            legend_title: default_legend_title(),
        }
    }
}

fn default_tick_ceiling() -> u64 {
    600
}

fn default_tick_step() -> u64 {
    100
}

fn default_bar_height_fraction() -> f64 {
    0.85
}

fn default_dpi() -> u32 {
    600
}

fn default_width_inches() -> f64 {
    20.0
}

fn default_height_inches() -> f64 {
    12.0
}

fn default_left_padding() -> f64 {
    1.12
}

fn default_right_padding() -> f64 {
    1.1
}

fn default_row_margin() -> f64 {
    0.8
}

fn default_panel_gap() -> f64 {
    0.04
}

fn default_left_title() -> String {
    "RSVA".to_string()
}

fn default_right_title() -> String {
    "RSVB".to_string()
}

fn default_legend_title() -> String {
    "Continents Distribution".to_string()
}

/// Text styling. Sizes are in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// TrueType font file. Falls back to common system fonts when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Family name the font is registered under.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_legend_title_size")]
    pub legend_title_size: f64,

    #[serde(default = "default_legend_size")]
    pub legend_size: f64,

    #[serde(default = "default_axis_title_size")]
    pub axis_title_size: f64,

    #[serde(default = "default_tick_label_size")]
    pub tick_label_size: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_family: default_font_family(),
            legend_title_size: default_legend_title_size(),
            legend_size: default_legend_size(),
            axis_title_size: default_axis_title_size(),
            tick_label_size: default_tick_label_size(),
        }
    }
}

fn default_font_family() -> String {
    "Times New Roman".to_string()
}

fn default_legend_title_size() -> f64 {
    26.0
}

fn default_legend_size() -> f64 {
    18.0
}

fn default_axis_title_size() -> f64 {
    16.0
}

fn default_tick_label_size() -> f64 {
    14.0
}

/// Inputs and outputs of the full pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of dataset A's category files.
    #[serde(default = "default_dataset_a")]
    pub dataset_a: PathBuf,

    /// Directory of dataset B's category files.
    #[serde(default = "default_dataset_b")]
    pub dataset_b: PathBuf,

    /// Aggregated table for dataset A.
    #[serde(default = "default_table_a")]
    pub table_a: PathBuf,

    /// Aggregated table for dataset B.
    #[serde(default = "default_table_b")]
    pub table_b: PathBuf,

    /// Rendered chart.
    #[serde(default = "default_chart_output")]
    pub chart: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_a: default_dataset_a(),
            dataset_b: default_dataset_b(),
            table_a: default_table_a(),
            table_b: default_table_b(),
            chart: default_chart_output(),
        }
    }
}

fn default_dataset_a() -> PathBuf {
    PathBuf::from("A")
}

fn default_dataset_b() -> PathBuf {
    PathBuf::from("B")
}

fn default_table_a() -> PathBuf {
    PathBuf::from("A-Yearly_Statistics.xlsx")
}

fn default_table_b() -> PathBuf {
    PathBuf::from("B-Yearly_Statistics.xlsx")
}

fn default_chart_output() -> PathBuf {
    PathBuf::from("Dual_Plot.tiff")
}

/// Continent mapping entries with their colors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentsConfig {
    /// Mapping layout version.
    #[serde(default = "default_mapping_version")]
    pub version: u32,

    /// One entry per continent.
    #[serde(default = "default_entries")]
    pub entries: Vec<ContinentEntry>,
}

/// One source label, its continent and its color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentEntry {
    pub source: String,
    pub continent: Continent,
    pub color: String,
}

impl Default for ContinentsConfig {
    fn default() -> Self {
        Self {
            version: default_mapping_version(),
            entries: default_entries(),
        }
    }
}

fn default_mapping_version() -> u32 {
    ContinentMapping::VERSION
}

fn default_entries() -> Vec<ContinentEntry> {
    let mapping = ContinentMapping::default();
    let palette = Palette::default();
    Continent::ALL
        .iter()
        .map(|&continent| ContinentEntry {
            source: mapping.source_label(continent).to_string(),
            continent,
            color: palette.color(continent).to_hex(),
        })
        .collect()
}

impl ContinentsConfig {
    /// Validated source-label mapping.
    pub fn mapping(&self) -> Result<ContinentMapping, ConfigError> {
        ContinentMapping::new(
            self.version,
            self.entries
                .iter()
                .map(|e| (e.source.trim().to_string(), e.continent))
                .collect(),
        )
    }

    /// Palette indexed by continent. Call after `mapping()` has validated
    /// that every continent has exactly one entry.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        let defaults = Palette::default();
        let mut slots = Continent::ALL.map(|c| defaults.color(c));
        for entry in &self.entries {
            slots[entry.continent.index()] = Rgb::from_hex(&entry.color)?;
        }
        Ok(Palette::new(slots))
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user passed explicitly override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        match &args.command {
            Command::Render(render) => {
                if let Some(dpi) = render.dpi {
                    self.chart.dpi = dpi;
                }
                if let Some(ceiling) = render.tick_ceiling {
                    self.chart.tick_ceiling = ceiling;
                }
                if let Some(step) = render.tick_step {
                    self.chart.tick_step = step;
                }
                if let Some(ref font) = render.font {
                    self.style.font_path = Some(font.clone());
                }
            }
            Command::Run(run) => {
                if let Some(ref dir) = run.dataset_a {
                    self.paths.dataset_a = dir.clone();
                }
                if let Some(ref dir) = run.dataset_b {
                    self.paths.dataset_b = dir.clone();
                }
                if let Some(ref output) = run.output {
                    self.paths.chart = output.clone();
                }
                if let Some(dpi) = run.dpi {
                    self.chart.dpi = dpi;
                }
            }
            Command::Aggregate(_) | Command::InitConfig => {}
        }
    }

    /// Check settings that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.continents.mapping()?;
        self.continents.palette()?;

        let chart = &self.chart;
        if chart.tick_step == 0 {
            return Err(ConfigError::InvalidChart("tick_step must be at least 1".into()));
        }
        if chart.dpi == 0 {
            return Err(ConfigError::InvalidChart("dpi must be at least 1".into()));
        }
        if !(chart.bar_height_fraction > 0.0 && chart.bar_height_fraction <= 1.0) {
            return Err(ConfigError::InvalidChart(
                "bar_height_fraction must be in (0, 1]".into(),
            ));
        }
        for (name, value) in [
            ("width_inches", chart.width_inches),
            ("height_inches", chart.height_inches),
            ("left_padding", chart.left_padding),
            ("right_padding", chart.right_padding),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidChart(format!(
                    "{name} must be a positive number"
                )));
            }
        }
        if !(chart.row_margin.is_finite() && chart.row_margin >= 0.0) {
            return Err(ConfigError::InvalidChart("row_margin must not be negative".into()));
        }
        if !(0.0..1.0).contains(&chart.panel_gap) {
            return Err(ConfigError::InvalidChart("panel_gap must be in [0, 1)".into()));
        }
        if self.aggregate.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::InvalidChart("extension must not be empty".into()));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chart.tick_ceiling, 600);
        assert_eq!(config.chart.tick_step, 100);
        assert_eq!(config.chart.bar_height_fraction, 0.85);
        assert_eq!(config.chart.dpi, 600);
        assert_eq!(config.aggregate.sheet_name, "Yearly Statistics");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[aggregate]
sheet_name = "Counts"

[chart]
tick_ceiling = 800
dpi = 150
left_title = "Left"

[style]
font_path = "/tmp/font.ttf"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.aggregate.sheet_name, "Counts");
        assert_eq!(config.aggregate.extension, "xlsx");
        assert_eq!(config.chart.tick_ceiling, 800);
        assert_eq!(config.chart.tick_step, 100);
        assert_eq!(config.chart.dpi, 150);
        assert_eq!(config.chart.left_title, "Left");
        assert_eq!(config.style.font_path, Some(PathBuf::from("/tmp/font.ttf")));
        assert_eq!(config.continents.entries.len(), 6);
    }

    #[test]
    fn test_parse_custom_continents() {
        let toml_content = r##"
[continents]
version = 1

[[continents.entries]]
source = "AS"
continent = "asia"
color = "#000001"

[[continents.entries]]
source = "NA"
continent = "north_america"
color = "#000002"

[[continents.entries]]
source = "SA"
continent = "south_america"
color = "#000003"

[[continents.entries]]
source = "OC"
continent = "oceania"
color = "#000004"

[[continents.entries]]
source = "EU"
continent = "europe"
color = "#000005"

[[continents.entries]]
source = "AF"
continent = "africa"
color = "#000006"
"##;

        let config: Config = toml::from_str(toml_content).unwrap();
        let mapping = config.continents.mapping().unwrap();
        assert_eq!(mapping.lookup("OC"), Some(Continent::Oceania));

        let palette = config.continents.palette().unwrap();
        assert_eq!(palette.color(Continent::Africa), Rgb(0, 0, 6));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.chart.tick_step = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chart.bar_height_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.continents.entries.pop();
        assert_eq!(config.validate(), Err(ConfigError::MappingSize(5)));

        let mut config = Config::default();
        config.continents.entries[0].color = "orange".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[aggregate]"));
        assert!(toml_str.contains("[chart]"));
        assert!(toml_str.contains("[[continents.entries]]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(reparsed.validate().is_ok());
    }
}
