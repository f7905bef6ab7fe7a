//! Static summary chart: a 2x2 SVG with the monthly trend line, monthly
//! min-max ranges, the category-by-month heatmap, and the location ranking.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use tracing::info;

use crate::analysis::SeasonalAnalysis;

pub const CHART_FILENAME: &str = "analisis_estacional_ganado.svg";

const MONTH_INITIALS: [&str; 12] = ["E", "F", "M", "A", "M", "J", "J", "A", "S", "O", "N", "D"];

/// Render the seasonal chart into `out_dir`.
pub fn save(analysis: &SeasonalAnalysis, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(CHART_FILENAME);
    render(analysis, &path)?;
    info!(path = %path.display(), "chart saved");
    Ok(path)
}

fn render(analysis: &SeasonalAnalysis, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (1280, 960)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("filling chart background: {e}"))?;
    root.titled(
        "Analisis Estacional de Precios de Ganado",
        ("sans-serif", 28),
    )
    .map_err(|e| anyhow!("drawing chart title: {e}"))?;

    let panels = root
        .margin(40, 10, 10, 10)
        .split_evenly((2, 2));

    draw_monthly_mean(&panels[0], analysis).context("monthly mean panel")?;
    draw_monthly_range(&panels[1], analysis).context("monthly range panel")?;
    draw_heatmap(&panels[2], analysis).context("heatmap panel")?;
    draw_lugar_ranking(&panels[3], analysis).context("location ranking panel")?;

    root.present().map_err(|e| anyhow!("writing chart to disk: {e}"))?;
    Ok(())
}

type Panel<'a> = DrawingArea<SVGBackend<'a>, plotters::coord::Shift>;

fn draw_monthly_mean(area: &Panel<'_>, analysis: &SeasonalAnalysis) -> Result<()> {
    let (y_min, y_max) = mean_bounds(analysis);
    let mut chart = ChartBuilder::on(area)
        .caption("Precio promedio por mes", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..13u32, y_min..y_max)
        .map_err(|e| anyhow!("building monthly mean chart: {e}"))?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&month_initial)
        .y_desc("Precio (B/.)")
        .draw()
        .map_err(|e| anyhow!("drawing monthly mean mesh: {e}"))?;

    let points: Vec<(u32, f64)> = analysis.monthly.iter().map(|m| (m.mes, m.mean)).collect();
    chart
        .draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))
        .map_err(|e| anyhow!("drawing monthly mean line: {e}"))?;
    chart
        .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())))
        .map_err(|e| anyhow!("drawing monthly mean points: {e}"))?;

    // Highlight the cheapest and most expensive months.
    if let Some(min) = points
        .iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).expect("means are finite"))
    {
        chart
            .draw_series(std::iter::once(Circle::new(*min, 7, GREEN.filled())))
            .map_err(|e| anyhow!("highlighting cheapest month: {e}"))?;
    }
    if let Some(max) = points
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).expect("means are finite"))
    {
        chart
            .draw_series(std::iter::once(Circle::new(*max, 7, RED.filled())))
            .map_err(|e| anyhow!("highlighting most expensive month: {e}"))?;
    }
    Ok(())
}

fn draw_monthly_range(area: &Panel<'_>, analysis: &SeasonalAnalysis) -> Result<()> {
    let y_max = analysis
        .monthly
        .iter()
        .map(|m| m.max)
        .fold(f64::NEG_INFINITY, f64::max)
        * 1.05;
    let mut chart = ChartBuilder::on(area)
        .caption("Rango de precios por mes", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..13u32, 0.0..y_max)
        .map_err(|e| anyhow!("building monthly range chart: {e}"))?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&month_initial)
        .y_desc("Precio (B/.)")
        .draw()
        .map_err(|e| anyhow!("drawing monthly range mesh: {e}"))?;

    chart
        .draw_series(analysis.monthly.iter().map(|m| {
            Rectangle::new(
                [(m.mes, m.min), (m.mes + 1, m.max)],
                BLUE.mix(0.35).filled(),
            )
        }))
        .map_err(|e| anyhow!("drawing monthly range bars: {e}"))?;
    Ok(())
}

fn draw_heatmap(area: &Panel<'_>, analysis: &SeasonalAnalysis) -> Result<()> {
    let matrix = &analysis.matrix;
    let n_cats = matrix.categorias.len().max(1);

    let (v_min, v_max) = matrix
        .values
        .iter()
        .flatten()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    let mut chart = ChartBuilder::on(area)
        .caption("Precio por categoria y mes", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(120)
        .build_cartesian_2d(1u32..13u32, 0usize..n_cats)
        .map_err(|e| anyhow!("building heatmap chart: {e}"))?;

    let categorias = matrix.categorias.clone();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(12)
        .x_label_formatter(&month_initial)
        .y_labels(n_cats)
        .y_label_formatter(&move |idx: &usize| {
            categorias.get(*idx).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(|e| anyhow!("drawing heatmap mesh: {e}"))?;

    let span = (v_max - v_min).max(f64::EPSILON);
    chart
        .draw_series(matrix.values.iter().enumerate().flat_map(|(cat_idx, row)| {
            row.iter().enumerate().filter_map(move |(mes_idx, value)| {
                let value = (*value)?;
                let t = ((value - v_min) / span).clamp(0.0, 1.0);
                // Pale yellow through red, hotter means more expensive.
                let color = RGBColor(255, (220.0 * (1.0 - t)) as u8 + 20, 40);
                let mes = mes_idx as u32 + 1;
                Some(Rectangle::new(
                    [(mes, cat_idx), (mes + 1, cat_idx + 1)],
                    color.filled(),
                ))
            })
        }))
        .map_err(|e| anyhow!("drawing heatmap cells: {e}"))?;
    Ok(())
}

fn draw_lugar_ranking(area: &Panel<'_>, analysis: &SeasonalAnalysis) -> Result<()> {
    // `lugares` is ascending by mean; take the 10 most expensive.
    let top: Vec<_> = analysis.lugares.iter().rev().take(10).collect();
    let n = top.len().max(1);
    let x_max = top
        .iter()
        .map(|l| l.mean)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1.0)
        * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption("Lugares con precios mas altos", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(120)
        .build_cartesian_2d(0.0..x_max, 0usize..n)
        .map_err(|e| anyhow!("building location ranking chart: {e}"))?;

    let names: Vec<String> = top.iter().map(|l| l.lugar.clone()).collect();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Precio promedio (B/.)")
        .y_labels(n)
        .y_label_formatter(&move |idx: &usize| names.get(*idx).cloned().unwrap_or_default())
        .draw()
        .map_err(|e| anyhow!("drawing location ranking mesh: {e}"))?;

    chart
        .draw_series(top.iter().enumerate().map(|(i, l)| {
            Rectangle::new([(0.0, i), (l.mean, i + 1)], MAGENTA.mix(0.6).filled())
        }))
        .map_err(|e| anyhow!("drawing location ranking bars: {e}"))?;
    Ok(())
}

fn mean_bounds(analysis: &SeasonalAnalysis) -> (f64, f64) {
    let lo = analysis
        .monthly
        .iter()
        .map(|m| m.mean)
        .fold(f64::INFINITY, f64::min);
    let hi = analysis
        .monthly
        .iter()
        .map(|m| m.mean)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.1).max(1.0);
    (lo - pad, hi + pad)
}

fn month_initial(mes: &u32) -> String {
    if (1..=12).contains(mes) {
        MONTH_INITIALS[*mes as usize - 1].to_string()
    } else {
        String::new()
    }
}
