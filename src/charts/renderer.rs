//! Static Chart Renderer
//! Draws the event comparison charts to PNG with plotters.
//!
//! Layout:
//! 1. distributions.png: 2x2 grid, one panel per numeric field, each with
//!    the two event curves overlaid as filled areas
//! 2. heatmap.png: region x platform mean spend grid, every populated cell
//!    annotated with its value

use crate::stats::{DensityEstimate, MeanTable, NumericField};
use log::info;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235); // Event 1
const SALMON: RGBColor = RGBColor(250, 128, 114); // Event 2
const GRID_LINE: RGBColor = RGBColor(255, 255, 255);

// YlGnBu stops for the heatmap: light, middle, dark
const HEAT_LOW: (f64, f64, f64) = (255.0, 255.0, 217.0);
const HEAT_MID: (f64, f64, f64) = (65.0, 182.0, 196.0);
const HEAT_HIGH: (f64, f64, f64) = (8.0, 29.0, 88.0);

pub const HEATMAP_TITLE: &str = "Average Dollars Spent per Player by Region and Platform";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart {path}: {reason}")]
    Draw { path: String, reason: String },
}

/// One field's estimates for the two compared windows.
#[derive(Debug, Clone)]
pub struct DensityPair {
    pub field: NumericField,
    pub first: (String, DensityEstimate),
    pub second: (String, DensityEstimate),
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render the 2x2 density grid.
    pub fn render_distributions(pairs: &[DensityPair], path: &Path) -> Result<(), RenderError> {
        Self::draw_distributions(pairs, path).map_err(|reason| RenderError::Draw {
            path: path.display().to_string(),
            reason,
        })?;
        info!("Wrote distribution chart to {}", path.display());
        Ok(())
    }

    /// Render the annotated region x platform heatmap.
    pub fn render_heatmap(table: &MeanTable, path: &Path) -> Result<(), RenderError> {
        Self::draw_heatmap(table, path).map_err(|reason| RenderError::Draw {
            path: path.display().to_string(),
            reason,
        })?;
        info!("Wrote heatmap to {}", path.display());
        Ok(())
    }

    fn draw_distributions(pairs: &[DensityPair], path: &Path) -> Result<(), String> {
        let root = BitMapBackend::new(path, (1300, 1000)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let panels = root.split_evenly((2, 2));
        for (panel, pair) in panels.iter().zip(pairs) {
            Self::draw_density_panel(panel, pair)?;
        }

        root.present().map_err(|e| e.to_string())
    }

    fn draw_density_panel<DB: DrawingBackend>(
        panel: &DrawingArea<DB, plotters::coord::Shift>,
        pair: &DensityPair,
    ) -> Result<(), String> {
        let series = [
            (&pair.first.0, &pair.first.1, SKY_BLUE),
            (&pair.second.0, &pair.second.1, SALMON),
        ];
        let curves: Vec<_> = series
            .iter()
            .filter_map(|(name, est, color)| est.curve().map(|c| (*name, c, *color)))
            .collect();

        if curves.is_empty() {
            let titled = panel
                .titled(pair.field.title(), ("sans-serif", 22))
                .map_err(|e| e.to_string())?;
            let (w, h) = titled.dim_in_pixel();
            let style = ("sans-serif", 18)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            titled
                .draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), style))
                .map_err(|e| e.to_string())?;
            return Ok(());
        }

        let x_lo = curves.iter().map(|(_, c, _)| c.x_range().0).fold(f64::INFINITY, f64::min);
        let x_hi = curves.iter().map(|(_, c, _)| c.x_range().1).fold(f64::NEG_INFINITY, f64::max);
        let y_hi = curves.iter().map(|(_, c, _)| c.max_density()).fold(0.0, f64::max) * 1.1;

        let mut chart = ChartBuilder::on(panel)
            .caption(pair.field.title(), ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_desc(pair.field.column_name())
            .y_desc("Density")
            .draw()
            .map_err(|e| e.to_string())?;

        for (name, curve, color) in curves {
            chart
                .draw_series(
                    AreaSeries::new(curve.points.iter().copied(), 0.0, color.mix(0.3))
                        .border_style(color.stroke_width(2)),
                )
                .map_err(|e| e.to_string())?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())
    }

    fn draw_heatmap(table: &MeanTable, path: &Path) -> Result<(), String> {
        let root = BitMapBackend::new(path, (1300, 800)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let root = root
            .titled(HEATMAP_TITLE, ("sans-serif", 26))
            .map_err(|e| e.to_string())?;

        let center = Pos::new(HPos::Center, VPos::Center);
        let (width, height) = root.dim_in_pixel();

        if table.is_empty() {
            let style = ("sans-serif", 20).into_font().color(&BLACK).pos(center);
            root.draw(&Text::new(
                "No data",
                (width as i32 / 2, height as i32 / 2),
                style,
            ))
            .map_err(|e| e.to_string())?;
            return root.present().map_err(|e| e.to_string());
        }

        let layout = HeatmapLayout::new(table, width, height);
        for (r, region) in table.rows.iter().enumerate() {
            let label_style = ("sans-serif", 18).into_font().color(&BLACK).pos(center);
            root.draw(&Text::new(
                region.as_str(),
                (LEFT / 2, layout.row_center(r)),
                label_style,
            ))
            .map_err(|e| e.to_string())?;
        }

        for cell in heatmap_cells(table, &layout) {
            let [(x0, y0), (x1, y1)] = cell.rect;
            root.draw(&Rectangle::new(cell.rect, heat_color(cell.shade).filled()))
                .map_err(|e| e.to_string())?;
            root.draw(&Rectangle::new(cell.rect, GRID_LINE.stroke_width(2)))
                .map_err(|e| e.to_string())?;

            let text_color = if cell.shade > 0.6 { WHITE } else { BLACK };
            let style = ("sans-serif", 18).into_font().color(&text_color).pos(center);
            root.draw(&Text::new(
                format!("{:.2}", cell.value),
                ((x0 + x1) / 2, (y0 + y1) / 2),
                style,
            ))
            .map_err(|e| e.to_string())?;
        }

        let axis_y = layout.axis_y(table.rows.len());
        for (c, platform) in table.columns.iter().enumerate() {
            let style = ("sans-serif", 18).into_font().color(&BLACK).pos(center);
            root.draw(&Text::new(
                platform.as_str(),
                (layout.column_center(c), axis_y),
                style,
            ))
            .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())
    }
}

// Heatmap margins, in pixels
const LEFT: i32 = 140;
const BOTTOM: i32 = 60;
const RIGHT: i32 = 40;
const TOP: i32 = 10;

/// Pixel grid for the heatmap body.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeatmapLayout {
    cell_w: i32,
    cell_h: i32,
}

impl HeatmapLayout {
    fn new(table: &MeanTable, width: u32, height: u32) -> Self {
        let grid_w = width as i32 - LEFT - RIGHT;
        let grid_h = height as i32 - BOTTOM - 2 * TOP;
        Self {
            cell_w: grid_w / table.columns.len().max(1) as i32,
            cell_h: grid_h / table.rows.len().max(1) as i32,
        }
    }

    fn cell_rect(&self, row: usize, column: usize) -> [(i32, i32); 2] {
        let x0 = LEFT + column as i32 * self.cell_w;
        let y0 = TOP + row as i32 * self.cell_h;
        [(x0, y0), (x0 + self.cell_w, y0 + self.cell_h)]
    }

    fn row_center(&self, row: usize) -> i32 {
        TOP + row as i32 * self.cell_h + self.cell_h / 2
    }

    fn column_center(&self, column: usize) -> i32 {
        LEFT + column as i32 * self.cell_w + self.cell_w / 2
    }

    fn axis_y(&self, rows: usize) -> i32 {
        TOP + rows as i32 * self.cell_h + BOTTOM / 2
    }
}

/// A populated heatmap cell, positioned and shaded.
#[derive(Debug, Clone, PartialEq)]
struct HeatCell {
    rect: [(i32, i32); 2],
    value: f64,
    /// Position of `value` within the table's range, in `[0, 1]`.
    shade: f64,
}

/// Cells to paint. Absent groups are skipped, leaving a blank square.
fn heatmap_cells(table: &MeanTable, layout: &HeatmapLayout) -> Vec<HeatCell> {
    let (lo, hi) = table.value_range().unwrap_or((0.0, 1.0));
    let mut cells = Vec::with_capacity(table.cell_count());

    for (r, region) in table.rows.iter().enumerate() {
        for (c, platform) in table.columns.iter().enumerate() {
            let Some(value) = table.get(region, platform) else {
                continue;
            };
            let shade = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
            cells.push(HeatCell {
                rect: layout.cell_rect(r, c),
                value,
                shade,
            });
        }
    }
    cells
}

/// Interpolate the heatmap palette at `t` in `[0, 1]`.
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (HEAT_LOW, HEAT_MID, t * 2.0)
    } else {
        (HEAT_MID, HEAT_HIGH, (t - 0.5) * 2.0)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
