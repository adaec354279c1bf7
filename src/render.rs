//! SVG comparison charts.
//!
//! Two chart shapes are drawn: a three-panel stacked area chart
//! (Sienna, Plexos, and their difference) and a line overlay in which
//! Sienna series are solid and Plexos series are dashed in the same color.
//! The horizontal axis is hours since the first timestamp.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::align::check_aligned;
use crate::error::{CompareError, Result};
use crate::palette::{Palette, Rgb};
use crate::table::{TimeSeriesTable, Timestamp};

/// Chart size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 900,
            height: 900,
        }
    }
}

/// One band of a stacked area chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayer {
    pub label: String,
    /// Bottom edge per row.
    pub lower: Vec<f64>,
    /// Top edge per row.
    pub upper: Vec<f64>,
}

/// Stacks the columns of `table` in column order.
///
/// Positive values stack upward from zero and negative values stack
/// downward from zero, each on its own running baseline, so a column that
/// changes sign never overlaps its neighbours. Missing cells are zero.
pub fn stack_layers(table: &TimeSeriesTable) -> Vec<StackLayer> {
    let mut positive = vec![0.0_f64; table.n_rows()];
    let mut negative = vec![0.0_f64; table.n_rows()];
    table
        .iter_columns()
        .map(|(label, values)| {
            let mut lower = Vec::with_capacity(values.len());
            let mut upper = Vec::with_capacity(values.len());
            for (row, value) in values.iter().enumerate() {
                let v = value.unwrap_or(0.0);
                let base = if v >= 0.0 {
                    &mut positive[row]
                } else {
                    &mut negative[row]
                };
                lower.push(*base);
                *base += v;
                upper.push(*base);
            }
            StackLayer {
                label: label.to_string(),
                lower,
                upper,
            }
        })
        .collect()
}

/// Lowest and highest edge over all layers, always including zero.
pub fn stack_extent(layers: &[StackLayer]) -> (f64, f64) {
    layers
        .iter()
        .flat_map(|l| l.lower.iter().chain(&l.upper))
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// Hours elapsed since the first timestamp of `index`.
pub fn hours_since_start(index: &[Timestamp]) -> Vec<f64> {
    let Some(t0) = index.first() else {
        return Vec::new();
    };
    index
        .iter()
        .map(|t| (*t - *t0).num_seconds() as f64 / 3600.0)
        .collect()
}

fn render_err<E: std::fmt::Display>(e: E) -> CompareError {
    CompareError::Render(e.to_string())
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

// Pads a value range by 5% and keeps it non-empty.
fn padded(lo: f64, hi: f64) -> std::ops::Range<f64> {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    (lo - 0.05 * span)..(hi + 0.05 * span)
}

fn x_range(hours: &[f64]) -> std::ops::Range<f64> {
    let end = hours.last().copied().unwrap_or(0.0);
    if end > 0.0 { 0.0..end } else { 0.0..1.0 }
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_stack<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    hours: &[f64],
    layers: &[StackLayer],
    palette: &Palette,
    legend: bool,
) -> Result<()> {
    for layer in layers {
        let color = rgb(palette.color(&layer.label));
        let upper = hours.iter().copied().zip(layer.upper.iter().copied());
        let lower = hours.iter().zip(&layer.lower).map(|(h, v)| (*h, *v));
        let points: Vec<(f64, f64)> = upper.chain(lower.rev()).collect();
        let anno = chart
            .draw_series(std::iter::once(Polygon::new(points, color.filled())))
            .map_err(render_err)?;
        if legend {
            let swatch = move |(x, y): (i32, i32)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            };
            anno.label(layer.label.clone()).legend(swatch);
        }
    }
    Ok(())
}

/// Draws the generation-by-fuel comparison to `path`.
///
/// Panels from top to bottom: Sienna, Plexos, and `delta` split into its
/// positive and negative parts. The first two panels share their y limits.
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] if the three tables are not
/// aligned and [`CompareError::Render`] if drawing fails.
pub fn render_generation_by_fuel(
    path: &Path,
    sienna: &TimeSeriesTable,
    plexos: &TimeSeriesTable,
    delta: &TimeSeriesTable,
    palette: &Palette,
    size: ChartSize,
) -> Result<()> {
    check_aligned(sienna, plexos)?;
    check_aligned(sienna, delta)?;

    let hours = hours_since_start(sienna.index());
    let sienna_layers = stack_layers(sienna);
    let plexos_layers = stack_layers(plexos);
    let delta_layers = stack_layers(delta);

    let (s_lo, s_hi) = stack_extent(&sienna_layers);
    let (p_lo, p_hi) = stack_extent(&plexos_layers);
    let shared = padded(s_lo.min(p_lo), s_hi.max(p_hi));
    let (d_lo, d_hi) = stack_extent(&delta_layers);
    let delta_range = padded(d_lo, d_hi);

    let root = SVGBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let panels = root.split_evenly((3, 1));

    let specs = [
        ("Sienna", &sienna_layers, shared.clone(), true),
        ("Plexos", &plexos_layers, shared, false),
        ("Sienna - Plexos", &delta_layers, delta_range, false),
    ];
    for (panel, (title, layers, y_range, legend)) in panels.iter().zip(specs) {
        let mut chart = ChartBuilder::on(panel)
            .caption(title, ("sans-serif", 18))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range(&hours), y_range)
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .x_desc("Hours")
            .y_desc("Production [MW]")
            .draw()
            .map_err(render_err)?;
        draw_stack(&mut chart, &hours, layers, palette, legend)?;
        if legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }
    }

    root.present().map_err(render_err)?;
    Ok(())
}

/// Draws each column of two aligned tables as lines to `path`.
///
/// Sienna series are solid and Plexos series dashed, in the same color per
/// column. Missing cells break the line.
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] if the tables are not
/// aligned and [`CompareError::Render`] if drawing fails.
pub fn render_line_overlay(
    path: &Path,
    title: &str,
    y_desc: &str,
    sienna: &TimeSeriesTable,
    plexos: &TimeSeriesTable,
    palette: &Palette,
    size: ChartSize,
) -> Result<()> {
    check_aligned(sienna, plexos)?;
    let hours = hours_since_start(sienna.index());

    let (lo, hi) = sienna
        .iter_columns()
        .chain(plexos.iter_columns())
        .flat_map(|(_, values)| values.iter().flatten())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let y_range = if lo.is_finite() {
        padded(lo, hi)
    } else {
        padded(0.0, 0.0)
    };

    let root = SVGBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range(&hours), y_range)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Hours")
        .y_desc(y_desc)
        .draw()
        .map_err(render_err)?;

    for (label, values) in sienna.iter_columns() {
        let color = rgb(palette.color(label));
        for run in present_runs(&hours, values) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(render_err)?;
        }
        let swatch = move |(x, y): (i32, i32)| {
            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
        };
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
            .map_err(render_err)?
            .label(label.to_string())
            .legend(swatch);
    }

    for (label, values) in plexos.iter_columns() {
        let style = rgb(palette.color(label)).stroke_width(2);
        let dashes = present_runs(&hours, values)
            .into_iter()
            .flat_map(dash_segments)
            .map(move |segment| PathElement::new(segment, style));
        chart.draw_series(dashes).map_err(render_err)?;
    }
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
        .map_err(render_err)?
        .label("Plexos (dashed)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 8, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Consecutive runs of present cells as `(hour, value)` points.
pub fn present_runs(hours: &[f64], values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (x, value) in hours.iter().zip(values) {
        match value {
            Some(y) => current.push((*x, *y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Every other segment of a polyline, drawn as a dashed line.
pub fn dash_segments(points: Vec<(f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    points
        .windows(2)
        .step_by(2)
        .map(|pair| pair.to_vec())
        .collect()
}
