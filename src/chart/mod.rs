//! Mirror chart rendering.
//!
//! Two continent tables are aligned onto shared years ([`align`]), laid out
//! as back-to-back stacked bars in data units ([`layout`]) and drawn with
//! plotters ([`renderer`]).

pub mod align;
pub mod font;
pub mod layout;
pub mod renderer;

pub use align::{align, load_aligned, AlignedPair};
pub use layout::{compute, LayoutParams, MirrorLayout};
pub use renderer::{render, RenderSettings};

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Load two aggregated tables and render their mirror chart to `output`.
pub fn render_tables(
    path_a: &Path,
    path_b: &Path,
    output: &Path,
    config: &Config,
) -> Result<MirrorLayout> {
    let mapping = config.continents.mapping()?;
    let palette = config.continents.palette()?;
    debug!("Continent mapping version {}", mapping.version());

    let pair = load_aligned(path_a, path_b, &mapping)?;
    let layout = compute(&pair, &LayoutParams::from(&config.chart));

    let settings = RenderSettings {
        chart: &config.chart,
        style: &config.style,
        palette: &palette,
    };
    render(&layout, output, &settings)
        .with_context(|| format!("Failed to render chart to {}", output.display()))?;

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearCountTable;
    use crate::workbook::write_year_table;
    use tempfile::TempDir;

    const LABELS: [&str; 6] = ["亚洲", "北美洲", "南美洲", "大洋洲", "欧洲", "非洲"];

    fn write_table(dir: &Path, name: &str, rows: Vec<(u32, Vec<u64>)>) -> std::path::PathBuf {
        let columns = LABELS.iter().map(|s| s.to_string()).collect();
        let table = YearCountTable::from_rows(columns, rows).unwrap();
        let path = dir.join(name);
        write_year_table(&table, "Yearly Statistics", &path).unwrap();
        path
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.chart.dpi = 30;
        config
    }

    #[test]
    fn test_render_tables_end_to_end() {
        let dir = TempDir::new().unwrap();
        let a = write_table(dir.path(), "A.xlsx", vec![(2020, vec![1, 2, 3, 0, 0, 0])]);
        let b = write_table(
            dir.path(),
            "B.xlsx",
            vec![(2020, vec![0, 0, 0, 6, 0, 0]), (2022, vec![1, 1, 1, 1, 1, 1])],
        );
        let output = dir.path().join("chart.png");

        let layout = render_tables(&a, &b, &output, &small_config()).unwrap();

        assert!(output.exists());
        assert_eq!(layout.years, vec![2020, 2022]);
        assert_eq!(layout.max_total, 6);
        // Identical totals for 2020 give identical stacked widths.
        assert_eq!(layout.left.row_width(0), layout.right.row_width(0));
        assert_eq!(layout.left.row_width(1), 0.0);
    }

    #[test]
    fn test_render_tables_rejects_unknown_columns() {
        let dir = TempDir::new().unwrap();
        let a = write_table(dir.path(), "A.xlsx", vec![(2020, vec![1; 6])]);

        let mut tallies = std::collections::BTreeMap::new();
        tallies.insert("Atlantis".to_string(), [(2020u32, 1u64)].into_iter().collect());
        let bad = dir.path().join("bad.xlsx");
        write_year_table(&YearCountTable::from_tallies(&tallies), "Yearly Statistics", &bad)
            .unwrap();

        let output = dir.path().join("chart.png");
        let err = render_tables(&a, &bad, &output, &small_config()).unwrap_err();
        assert!(format!("{:#}", err).contains("Atlantis"));
        assert!(!output.exists());
    }
}
