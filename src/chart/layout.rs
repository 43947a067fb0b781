//! Mirror chart geometry in data coordinates.
//!
//! Both panels share row positions, bar thickness and vertical extent. The
//! left panel anchors its stacks at the tick ceiling and grows toward zero;
//! the right panel stacks from zero. Axis limits cover at least the tick
//! ceiling and grow with the data; tick marks always run from 0 to the
//! ceiling.

use super::align::AlignedPair;
use crate::config::ChartConfig;
use crate::models::{Continent, ContinentTable};

/// Which half of the mirror chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Mirrored panel; bars grow right-to-left.
    Left,
    /// Normal panel; bars grow left-to-right.
    Right,
}

/// Geometry parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub tick_ceiling: u64,
    pub tick_step: u64,
    pub bar_height_fraction: f64,
    pub left_padding: f64,
    pub right_padding: f64,
    pub row_margin: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::from(&ChartConfig::default())
    }
}

impl From<&ChartConfig> for LayoutParams {
    fn from(config: &ChartConfig) -> Self {
        Self {
            tick_ceiling: config.tick_ceiling,
            tick_step: config.tick_step,
            bar_height_fraction: config.bar_height_fraction,
            left_padding: config.left_padding,
            right_padding: config.right_padding,
            row_margin: config.row_margin,
        }
    }
}

/// One stacked bar piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Row index (position of the year).
    pub row: usize,
    pub continent: Continent,
    /// Left edge in data units.
    pub left: f64,
    pub width: f64,
}

/// A labeled tick mark.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Geometry of one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub side: Side,
    /// Data value at the panel's left edge.
    pub x_min: f64,
    /// Data value at the panel's right edge.
    pub x_max: f64,
    pub segments: Vec<Segment>,
    pub ticks: Vec<Tick>,
    /// Extent of the top and bottom axis lines.
    pub spine: (f64, f64),
}

impl PanelLayout {
    /// Summed segment widths for one row.
    pub fn row_width(&self, row: usize) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.row == row)
            .map(|s| s.width)
            .sum()
    }

    /// Data value at the edge facing the other panel.
    pub fn inner_edge(&self) -> f64 {
        match self.side {
            Side::Left => self.x_max,
            Side::Right => self.x_min,
        }
    }
}

/// Complete mirror chart geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorLayout {
    pub years: Vec<u32>,
    /// Vertical position of each row; row `k` sits at `k`.
    pub row_positions: Vec<f64>,
    pub bar_height: f64,
    /// Shared vertical extent of both panels.
    pub y_range: (f64, f64),
    pub max_total: u64,
    pub left: PanelLayout,
    pub right: PanelLayout,
    /// Legend entries in canonical order.
    pub legend: Vec<Continent>,
}

/// Tick positions from 0 to `ceiling` inclusive.
pub fn tick_positions(ceiling: u64, step: u64) -> Vec<u64> {
    (0..=ceiling).step_by(step.max(1) as usize).collect()
}

/// Compute the layout of an aligned pair.
pub fn compute(pair: &AlignedPair, params: &LayoutParams) -> MirrorLayout {
    let years = pair.years().to_vec();
    let rows = years.len();
    let max_total = pair.max_total();
    let ceiling = params.tick_ceiling as f64;

    // Panels always reach the ceiling so every tick and the mirrored anchor
    // stay visible; larger totals push the limit out.
    let extent = |padding: f64| (max_total as f64 * padding).max(ceiling).max(1.0);

    let positions = tick_positions(params.tick_ceiling, params.tick_step);

    let left = PanelLayout {
        side: Side::Left,
        x_min: 0.0,
        x_max: extent(params.left_padding),
        segments: stack(&pair.a, |cumulative, width| ceiling - cumulative - width),
        ticks: positions
            .iter()
            .map(|&p| Tick {
                position: p as f64,
                label: (params.tick_ceiling - p).to_string(),
            })
            .collect(),
        spine: (0.0, ceiling),
    };

    let right = PanelLayout {
        side: Side::Right,
        x_min: 0.0,
        x_max: extent(params.right_padding),
        segments: stack(&pair.b, |cumulative, _| cumulative),
        ticks: positions
            .iter()
            .map(|&p| Tick {
                position: p as f64,
                label: p.to_string(),
            })
            .collect(),
        spine: (0.0, ceiling),
    };

    let last = rows.saturating_sub(1) as f64;
    MirrorLayout {
        row_positions: (0..rows).map(|r| r as f64).collect(),
        bar_height: params.bar_height_fraction,
        y_range: (-params.row_margin, last + params.row_margin),
        max_total,
        left,
        right,
        legend: Continent::ALL.to_vec(),
        years,
    }
}

/// Stack each row's continents in canonical order; `place` maps the width
/// accumulated so far and the segment width to the segment's left edge.
fn stack(table: &ContinentTable, place: impl Fn(f64, f64) -> f64) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(table.rows().len() * Continent::COUNT);
    for (row, counts) in table.rows().iter().enumerate() {
        let mut cumulative = 0.0;
        for continent in Continent::ALL {
            let width = counts[continent.index()] as f64;
            segments.push(Segment {
                row,
                continent,
                left: place(cumulative, width),
                width,
            });
            cumulative += width;
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::align::align;

    fn pair(a: Vec<(u32, [u64; 6])>, b: Vec<(u32, [u64; 6])>) -> AlignedPair {
        let (ya, ra) = a.into_iter().unzip();
        let (yb, rb) = b.into_iter().unzip();
        align(
            &ContinentTable::from_parts(ya, ra),
            &ContinentTable::from_parts(yb, rb),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_positions() {
        assert_eq!(tick_positions(600, 100), vec![0, 100, 200, 300, 400, 500, 600]);
        assert_eq!(tick_positions(250, 100), vec![0, 100, 200]);
    }

    #[test]
    fn test_ticks_fixed_regardless_of_data() {
        let params = LayoutParams::default();
        let expected: Vec<f64> = (0..=6).map(|i| (i * 100) as f64).collect();

        for total in [10u64, 600, 5000] {
            let layout = compute(&pair(vec![(2020, [total, 0, 0, 0, 0, 0])], vec![]), &params);
            let left: Vec<f64> = layout.left.ticks.iter().map(|t| t.position).collect();
            let right: Vec<f64> = layout.right.ticks.iter().map(|t| t.position).collect();
            assert_eq!(left, expected);
            assert_eq!(right, expected);
            assert_eq!(layout.max_total, total);
        }
    }

    #[test]
    fn test_left_tick_labels_reversed() {
        let layout = compute(
            &pair(vec![(2020, [1; 6])], vec![]),
            &LayoutParams::default(),
        );
        let left: Vec<&str> = layout.left.ticks.iter().map(|t| t.label.as_str()).collect();
        let right: Vec<&str> = layout.right.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(left, vec!["600", "500", "400", "300", "200", "100", "0"]);
        assert_eq!(right, vec!["0", "100", "200", "300", "400", "500", "600"]);
    }

    #[test]
    fn test_axis_limits_follow_large_data() {
        let layout = compute(
            &pair(vec![(2020, [500, 500, 0, 0, 0, 0])], vec![(2020, [50; 6])]),
            &LayoutParams::default(),
        );
        assert_eq!(layout.max_total, 1000);
        assert!((layout.left.x_max - 1120.0).abs() < 1e-9);
        assert!((layout.right.x_max - 1100.0).abs() < 1e-9);
        assert_eq!(layout.left.spine, (0.0, 600.0));
        assert_eq!(layout.left.inner_edge(), layout.left.x_max);
        assert_eq!(layout.right.inner_edge(), 0.0);
    }

    #[test]
    fn test_small_data_keeps_ceiling_visible() {
        let layout = compute(
            &pair(
                vec![(2020, [100, 100, 100, 0, 0, 0])],
                vec![(2020, [100, 100, 100, 0, 0, 0])],
            ),
            &LayoutParams::default(),
        );
        assert_eq!(layout.max_total, 300);
        assert_eq!(layout.left.x_max, 600.0);
        assert_eq!(layout.right.x_max, 600.0);

        for panel in [&layout.left, &layout.right] {
            assert_eq!(panel.ticks.len(), 7);
            for tick in &panel.ticks {
                assert!(tick.position >= panel.x_min && tick.position <= panel.x_max);
            }
            for segment in panel.segments.iter().filter(|s| s.width > 0.0) {
                assert!(segment.left >= panel.x_min);
                assert!(segment.left + segment.width <= panel.x_max);
            }
        }
        assert_eq!(layout.left.row_width(0), 300.0);
        assert_eq!(layout.right.row_width(0), 300.0);
    }

    #[test]
    fn test_zero_data_uses_ceiling() {
        let layout = compute(&pair(vec![(2020, [0; 6])], vec![]), &LayoutParams::default());
        assert_eq!(layout.max_total, 0);
        assert_eq!(layout.left.x_max, 600.0);
        assert_eq!(layout.right.x_max, 600.0);
    }

    #[test]
    fn test_left_segments_anchor_at_ceiling() {
        let layout = compute(
            &pair(vec![(2020, [10, 20, 0, 0, 0, 5])], vec![]),
            &LayoutParams::default(),
        );
        let row: Vec<&Segment> = layout.left.segments.iter().filter(|s| s.row == 0).collect();

        assert_eq!(row[0].continent, Continent::Asia);
        assert_eq!((row[0].left, row[0].width), (590.0, 10.0));
        assert_eq!((row[1].left, row[1].width), (570.0, 20.0));
        assert_eq!(row[5].continent, Continent::Africa);
        assert_eq!((row[5].left, row[5].width), (565.0, 5.0));
    }

    #[test]
    fn test_right_segments_stack_from_zero() {
        let layout = compute(
            &pair(vec![], vec![(2020, [10, 20, 0, 0, 0, 5])]),
            &LayoutParams::default(),
        );
        let lefts: Vec<f64> = layout.right.segments.iter().map(|s| s.left).collect();
        assert_eq!(lefts, vec![0.0, 10.0, 30.0, 30.0, 30.0, 30.0]);
    }

    #[test]
    fn test_equal_totals_give_equal_widths() {
        let layout = compute(
            &pair(
                vec![(2019, [5, 5, 0, 0, 0, 0]), (2020, [1, 2, 3, 4, 5, 6])],
                vec![(2019, [0, 0, 0, 0, 0, 10]), (2020, [21, 0, 0, 0, 0, 0])],
            ),
            &LayoutParams::default(),
        );

        for row in 0..layout.years.len() {
            assert_eq!(layout.left.row_width(row), layout.right.row_width(row));
        }
    }

    #[test]
    fn test_shared_rows() {
        let layout = compute(
            &pair(vec![(2018, [1; 6]), (2020, [1; 6])], vec![(2019, [2; 6])]),
            &LayoutParams::default(),
        );
        assert_eq!(layout.years, vec![2018, 2019, 2020]);
        assert_eq!(layout.row_positions, vec![0.0, 1.0, 2.0]);
        assert_eq!(layout.y_range, (-0.8, 2.8));
        assert_eq!(layout.bar_height, 0.85);
        assert_eq!(layout.left.segments.len(), 18);
        assert_eq!(layout.right.segments.len(), 18);
        assert_eq!(layout.legend, Continent::ALL.to_vec());
    }
}
