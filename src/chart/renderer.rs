//! Mirror chart drawing with plotters.
//!
//! The layout is computed in data units by [`super::layout`]; this module maps
//! it onto a pixel canvas and draws it to a PNG, TIFF or SVG file. Raster
//! output is drawn into an in-memory RGB buffer and encoded with `image`.

use super::font;
use super::layout::{MirrorLayout, PanelLayout};
use crate::config::{ChartConfig, StyleConfig};
use crate::error::RenderError;
use crate::models::{Palette, Rgb};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{debug, info};

/// Largest canvas we are willing to allocate.
const MAX_PIXELS: u64 = 400_000_000;

/// Points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Everything the renderer needs besides the layout.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings<'a> {
    pub chart: &'a ChartConfig,
    pub style: &'a StyleConfig,
    pub palette: &'a Palette,
}

/// File kind chosen from the output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Svg,
    Raster(ImageFormat),
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("svg") => Ok(OutputKind::Svg),
            Some("png") => Ok(OutputKind::Raster(ImageFormat::Png)),
            Some("tif") | Some("tiff") => Ok(OutputKind::Raster(ImageFormat::Tiff)),
            _ => Err(RenderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Pixel size of the figure.
pub fn canvas_size(chart: &ChartConfig) -> Result<(u32, u32), RenderError> {
    let dpi = f64::from(chart.dpi);
    let width = (chart.width_inches * dpi).round();
    let height = (chart.height_inches * dpi).round();

    let too_large = || RenderError::TooLarge {
        width: width.max(0.0) as u64,
        height: height.max(0.0) as u64,
    };
    let limit = f64::from(u32::MAX);
    if !(width >= 1.0 && height >= 1.0 && width <= limit && height <= limit) {
        return Err(too_large());
    }
    if (width as u64) * (height as u64) > MAX_PIXELS {
        return Err(too_large());
    }

    Ok((width as u32, height as u32))
}

/// A pixel rectangle, `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Pixel placement of every figure region.
#[derive(Debug, Clone, PartialEq)]
struct Canvas {
    width: u32,
    /// Pixels per typographic point.
    scale: f64,
    left: PixelRect,
    right: PixelRect,
    legend_title_y: i32,
    legend_row_y: i32,
}

impl Canvas {
    fn plan(width: u32, height: u32, settings: &RenderSettings<'_>) -> Result<Self, RenderError> {
        let chart = settings.chart;
        let style = settings.style;
        let scale = f64::from(chart.dpi) / POINTS_PER_INCH;
        let margin = 0.3 * f64::from(chart.dpi);

        let legend_band = (style.legend_title_size * 2.4 + style.legend_size * 2.0) * scale;
        let header = (style.tick_label_size * 1.8 + style.axis_title_size * 2.2 + 5.0) * scale;

        let top = legend_band + header;
        let bottom = f64::from(height) - margin;
        let available = f64::from(width) - 2.0 * margin;
        let panel = available / (2.0 + chart.panel_gap);
        if bottom - top < 1.0 || panel < 1.0 {
            return Err(RenderError::Draw(format!(
                "figure of {width}x{height} pixels is too small for its text"
            )));
        }
        let gap = panel * chart.panel_gap;

        let rect = |x0: f64, x1: f64| PixelRect {
            x0: x0.round() as i32,
            y0: top.round() as i32,
            x1: x1.round() as i32,
            y1: bottom.round() as i32,
        };

        Ok(Self {
            width,
            scale,
            left: rect(margin, margin + panel),
            right: rect(margin + panel + gap, f64::from(width) - margin),
            legend_title_y: (style.legend_title_size * 0.4 * scale).round() as i32,
            legend_row_y: ((style.legend_title_size * 2.4 + style.legend_size * 0.8) * scale)
                .round() as i32,
        })
    }

    fn pt(&self, points: f64) -> i32 {
        (points * self.scale).round() as i32
    }
}

/// Maps one panel's data coordinates to pixels.
struct PanelMap<'a> {
    rect: PixelRect,
    panel: &'a PanelLayout,
    y_range: (f64, f64),
}

impl PanelMap<'_> {
    fn x_unclamped(&self, value: f64) -> f64 {
        let span = self.panel.x_max - self.panel.x_min;
        let t = if span > 0.0 {
            (value - self.panel.x_min) / span
        } else {
            0.0
        };
        f64::from(self.rect.x0) + t * f64::from(self.rect.x1 - self.rect.x0)
    }

    /// Pixel column for a data value, clipped to the panel.
    fn x(&self, value: f64) -> i32 {
        (self.x_unclamped(value).round() as i32).clamp(self.rect.x0, self.rect.x1)
    }

    /// Pixel row for a data value; larger values are higher up.
    fn y(&self, value: f64) -> i32 {
        let (lo, hi) = self.y_range;
        let span = hi - lo;
        let t = if span > 0.0 { (value - lo) / span } else { 0.5 };
        let py = f64::from(self.rect.y1) - t * f64::from(self.rect.y1 - self.rect.y0);
        (py.round() as i32).clamp(self.rect.y0, self.rect.y1)
    }

    fn contains_x(&self, value: f64) -> bool {
        let px = self.x_unclamped(value);
        px >= f64::from(self.rect.x0) - 0.5 && px <= f64::from(self.rect.x1) + 0.5
    }
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn draw_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Render a computed layout to `output`.
pub fn render(
    layout: &MirrorLayout,
    output: &Path,
    settings: &RenderSettings<'_>,
) -> Result<(), RenderError> {
    let kind = OutputKind::from_path(output)?;
    let (width, height) = canvas_size(settings.chart)?;
    let canvas = Canvas::plan(width, height, settings)?;
    let family = font::load_font(settings.style)?;
    debug!("Canvas {}x{} px, text: {}", width, height, family.is_some());

    match kind {
        OutputKind::Svg => {
            let root = SVGBackend::new(output, (width, height)).into_drawing_area();
            draw_chart(&root, layout, &canvas, settings, family).map_err(draw_error)?;
            root.present().map_err(draw_error)?;
        }
        OutputKind::Raster(format) => {
            let mut buffer = vec![0u8; width as usize * height as usize * 3];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
                    .into_drawing_area();
                draw_chart(&root, layout, &canvas, settings, family).map_err(draw_error)?;
                root.present().map_err(draw_error)?;
            }
            let image = RgbImage::from_raw(width, height, buffer)
                .ok_or_else(|| RenderError::Encode("pixel buffer size mismatch".to_string()))?;
            image
                .save_with_format(output, format)
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
    }

    info!("Rendered {} years to {}", layout.years.len(), output.display());
    Ok(())
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &MirrorLayout,
    canvas: &Canvas,
    settings: &RenderSettings<'_>,
    family: Option<&str>,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let panels = [
        (&layout.left, canvas.left, &settings.chart.left_title),
        (&layout.right, canvas.right, &settings.chart.right_title),
    ];
    for (panel, rect, title) in panels {
        let map = PanelMap {
            rect,
            panel,
            y_range: layout.y_range,
        };
        draw_grid(root, &map, canvas)?;
        draw_bars(root, &map, layout, canvas, settings.palette)?;
        draw_axes(root, &map, canvas)?;
        if let Some(family) = family {
            draw_axis_text(root, &map, canvas, settings.style, family, title)?;
        }
    }

    if let Some(family) = family {
        draw_year_labels(root, layout, canvas, settings.style, family)?;
    }
    draw_legend(root, layout, canvas, settings, family)
}

fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    map: &PanelMap<'_>,
    canvas: &Canvas,
) -> DrawResult<DB> {
    let style = RGBColor(176, 176, 176).mix(0.5).stroke_width(canvas.pt(0.8).max(1) as u32);
    let dash = canvas.pt(1.0).max(1);

    for tick in map.panel.ticks.iter().filter(|t| map.contains_x(t.position)) {
        let x = map.x(tick.position);
        let mut y = map.rect.y0;
        while y < map.rect.y1 {
            let end = (y + dash).min(map.rect.y1);
            root.draw(&PathElement::new(vec![(x, y), (x, end)], style))?;
            y += dash * 3;
        }
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    map: &PanelMap<'_>,
    layout: &MirrorLayout,
    canvas: &Canvas,
    palette: &Palette,
) -> DrawResult<DB> {
    let edge = WHITE.stroke_width(canvas.pt(0.8).max(1) as u32);
    let half = layout.bar_height / 2.0;

    for segment in map.panel.segments.iter().filter(|s| s.width > 0.0) {
        let center = layout.row_positions[segment.row];
        let (x0, x1) = (map.x(segment.left), map.x(segment.left + segment.width));
        let (y0, y1) = (map.y(center + half), map.y(center - half));
        if x1 <= x0 || y1 <= y0 {
            continue;
        }

        let fill = color(palette.color(segment.continent)).filled();
        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], fill))?;
        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], edge))?;
    }
    Ok(())
}

fn draw_axes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    map: &PanelMap<'_>,
    canvas: &Canvas,
) -> DrawResult<DB> {
    let line = BLACK.stroke_width(canvas.pt(1.5).max(1) as u32);
    let (from, to) = (map.x(map.panel.spine.0), map.x(map.panel.spine.1));
    for y in [map.rect.y0, map.rect.y1] {
        root.draw(&PathElement::new(vec![(from, y), (to, y)], line))?;
    }

    let length = canvas.pt(5.0);
    for tick in map.panel.ticks.iter().filter(|t| map.contains_x(t.position)) {
        let x = map.x(tick.position);
        root.draw(&PathElement::new(
            vec![(x, map.rect.y0), (x, map.rect.y0 - length)],
            line,
        ))?;
    }
    Ok(())
}

fn text_style<'a>(family: &'a str, points: f64, canvas: &Canvas, pos: Pos) -> TextStyle<'a> {
    (FontFamily::Name(family), points * canvas.scale)
        .into_font()
        .color(&BLACK)
        .pos(pos)
}

fn draw_axis_text<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    map: &PanelMap<'_>,
    canvas: &Canvas,
    style: &StyleConfig,
    family: &str,
    title: &str,
) -> DrawResult<DB> {
    let tick_style = text_style(
        family,
        style.tick_label_size,
        canvas,
        Pos::new(HPos::Center, VPos::Bottom),
    );
    let label_y = map.rect.y0 - canvas.pt(5.0 + 3.5);
    for tick in map.panel.ticks.iter().filter(|t| map.contains_x(t.position)) {
        root.draw(&Text::new(
            tick.label.clone(),
            (map.x(tick.position), label_y),
            tick_style.clone(),
        ))?;
    }

    let title_style = text_style(
        family,
        style.axis_title_size,
        canvas,
        Pos::new(HPos::Center, VPos::Bottom),
    );
    let title_y = label_y - canvas.pt(style.tick_label_size * 1.2 + 15.0 * 0.5);
    let center = (map.rect.x0 + map.rect.x1) / 2;
    root.draw(&Text::new(title.to_string(), (center, title_y), title_style))
}

fn draw_year_labels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &MirrorLayout,
    canvas: &Canvas,
    style: &StyleConfig,
    family: &str,
) -> DrawResult<DB> {
    let map = PanelMap {
        rect: canvas.right,
        panel: &layout.right,
        y_range: layout.y_range,
    };
    let label_style = text_style(
        family,
        style.tick_label_size,
        canvas,
        Pos::new(HPos::Right, VPos::Center),
    );
    let x = map.x(layout.right.inner_edge()) - canvas.pt(3.5);

    for (year, position) in layout.years.iter().zip(&layout.row_positions) {
        root.draw(&Text::new(year.to_string(), (x, map.y(*position)), label_style.clone()))?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &MirrorLayout,
    canvas: &Canvas,
    settings: &RenderSettings<'_>,
    family: Option<&str>,
) -> DrawResult<DB> {
    let size = settings.style.legend_size;
    let handle = canvas.pt(size * 1.4);
    let handle_height = canvas.pt(size * 0.7);
    let text_gap = canvas.pt(size * 0.8);
    let spacing = canvas.pt(size * 2.5);
    // Text is not measured; an average glyph width keeps the row centered.
    let text_width = |label: &str| canvas.pt(size * 0.55 * label.chars().count() as f64);

    let entries: Vec<(&str, i32)> = layout
        .legend
        .iter()
        .map(|c| (c.display_name(), handle + text_gap + text_width(c.display_name())))
        .collect();
    let total: i32 = entries.iter().map(|(_, w)| w).sum::<i32>()
        + spacing * (entries.len().saturating_sub(1) as i32);

    let mut x = (canvas.width as i32 - total) / 2;
    let y = canvas.legend_row_y;
    let label_style =
        family.map(|f| text_style(f, size, canvas, Pos::new(HPos::Left, VPos::Center)));

    for (continent, (label, width)) in layout.legend.iter().zip(&entries) {
        let fill = color(settings.palette.color(*continent)).filled();
        root.draw(&Rectangle::new(
            [(x, y - handle_height / 2), (x + handle, y + handle_height / 2)],
            fill,
        ))?;
        if let Some(ref style) = label_style {
            root.draw(&Text::new(label.to_string(), (x + handle + text_gap, y), style.clone()))?;
        }
        x += width + spacing;
    }

    if let Some(family) = family {
        let title_style = text_style(
            family,
            settings.style.legend_title_size,
            canvas,
            Pos::new(HPos::Center, VPos::Top),
        );
        root.draw(&Text::new(
            settings.chart.legend_title.clone(),
            (canvas.width as i32 / 2, canvas.legend_title_y),
            title_style,
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::align::align;
    use crate::chart::layout::{compute, LayoutParams};
    use crate::models::ContinentTable;
    use tempfile::TempDir;

    fn small_chart() -> ChartConfig {
        ChartConfig {
            dpi: 30,
            ..ChartConfig::default()
        }
    }

    fn sample_layout() -> MirrorLayout {
        let a = ContinentTable::from_parts(vec![2019, 2020], vec![[10, 20, 30, 5, 5, 0], [100; 6]]);
        let b = ContinentTable::from_parts(vec![2020, 2021], vec![[50; 6], [0, 0, 0, 0, 0, 300]]);
        compute(&align(&a, &b).unwrap(), &LayoutParams::default())
    }

    #[test]
    fn test_output_kind() {
        assert_eq!(OutputKind::from_path(Path::new("a.svg")).unwrap(), OutputKind::Svg);
        assert_eq!(
            OutputKind::from_path(Path::new("a.TIFF")).unwrap(),
            OutputKind::Raster(ImageFormat::Tiff)
        );
        assert_eq!(
            OutputKind::from_path(Path::new("a.png")).unwrap(),
            OutputKind::Raster(ImageFormat::Png)
        );
        assert!(OutputKind::from_path(Path::new("a.pdf")).is_err());
        assert!(OutputKind::from_path(Path::new("chart")).is_err());
    }

    #[test]
    fn test_canvas_size() {
        assert_eq!(canvas_size(&ChartConfig::default()).unwrap(), (12000, 7200));
        assert_eq!(canvas_size(&small_chart()).unwrap(), (600, 360));

        let huge = ChartConfig {
            dpi: 10_000,
            ..ChartConfig::default()
        };
        assert!(matches!(canvas_size(&huge), Err(RenderError::TooLarge { .. })));
    }

    #[test]
    fn test_panels_share_vertical_extent() {
        let chart = small_chart();
        let style = StyleConfig::default();
        let palette = Palette::default();
        let settings = RenderSettings {
            chart: &chart,
            style: &style,
            palette: &palette,
        };

        let canvas = Canvas::plan(600, 360, &settings).unwrap();
        assert_eq!(canvas.left.y0, canvas.right.y0);
        assert_eq!(canvas.left.y1, canvas.right.y1);
        assert!(canvas.left.x1 <= canvas.right.x0);
        assert_eq!(
            canvas.left.x1 - canvas.left.x0,
            canvas.right.x1 - canvas.right.x0
        );
    }

    #[test]
    fn test_panel_map_rows_align() {
        let layout = sample_layout();
        let rect = PixelRect {
            x0: 0,
            y0: 0,
            x1: 100,
            y1: 100,
        };
        let left = PanelMap {
            rect,
            panel: &layout.left,
            y_range: layout.y_range,
        };
        let right = PanelMap {
            rect,
            panel: &layout.right,
            y_range: layout.y_range,
        };

        for position in &layout.row_positions {
            assert_eq!(left.y(*position), right.y(*position));
        }
        assert!(left.y(0.0) > left.y(1.0));
        assert_eq!(left.x(-50.0), 0);
        assert_eq!(right.x(1e9), 100);
    }

    #[test]
    fn test_small_totals_draw_every_tick_and_segment() {
        let row = [100, 100, 100, 0, 0, 0];
        let pair = align(
            &ContinentTable::from_parts(vec![2020], vec![row]),
            &ContinentTable::from_parts(vec![2020], vec![row]),
        )
        .unwrap();
        let layout = compute(&pair, &LayoutParams::default());
        let rect = PixelRect {
            x0: 0,
            y0: 0,
            x1: 600,
            y1: 100,
        };

        for panel in [&layout.left, &layout.right] {
            let map = PanelMap {
                rect,
                panel,
                y_range: layout.y_range,
            };
            assert!(panel.ticks.iter().all(|t| map.contains_x(t.position)));

            let drawn: i32 = panel
                .segments
                .iter()
                .filter(|s| s.width > 0.0)
                .map(|s| map.x(s.left + s.width) - map.x(s.left))
                .sum();
            assert_eq!(drawn, 300);
        }
    }

    #[test]
    fn test_render_svg_and_png() {
        let chart = small_chart();
        let style = StyleConfig::default();
        let palette = Palette::default();
        let settings = RenderSettings {
            chart: &chart,
            style: &style,
            palette: &palette,
        };
        let layout = sample_layout();
        let dir = TempDir::new().unwrap();

        let svg = dir.path().join("chart.svg");
        render(&layout, &svg, &settings).unwrap();
        let content = std::fs::read_to_string(&svg).unwrap();
        assert!(content.contains("<svg"));

        let png = dir.path().join("chart.png");
        render(&layout, &png, &settings).unwrap();
        assert_eq!(image::image_dimensions(&png).unwrap(), (600, 360));
    }

    #[test]
    fn test_render_rejects_unknown_extension() {
        let chart = small_chart();
        let style = StyleConfig::default();
        let palette = Palette::default();
        let settings = RenderSettings {
            chart: &chart,
            style: &style,
            palette: &palette,
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.gif");

        let result = render(&sample_layout(), &path, &settings);
        assert!(matches!(result, Err(RenderError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }
}
