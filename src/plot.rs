use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;

use crate::describe::Histogram;
use crate::forecast::Forecast;

const WIDE: (u32, u32) = (1200, 500);
const GRID: (u32, u32) = (1600, 1000);

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-9);
    (lo - pad, hi + pad)
}

/// Line plot of the response over trading days.
pub fn response_series(path: &Path, name: &str, values: &[f64]) -> Result<()> {
    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    let (lo, hi) = span(values.iter().copied());
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} by trading day", name), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..values.len().max(1) as f64, lo..hi)
        .map_err(|e| anyhow!("chart build: {}", e))?;
    chart
        .configure_mesh()
        .x_desc("day")
        .y_desc(name)
        .draw()
        .map_err(|e| anyhow!("mesh: {}", e))?;
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("line series: {}", e))?;
    root.present().map_err(|e| anyhow!("present: {}", e))?;
    Ok(())
}

pub fn histograms(path: &Path, hists: &[Histogram]) -> Result<()> {
    let root = SVGBackend::new(path, GRID).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    let cols = 4;
    let rows = hists.len().div_ceil(cols).max(1);
    let areas = root.split_evenly((rows, cols));
    for (area, hist) in areas.iter().zip(hists) {
        if hist.counts.is_empty() {
            continue;
        }
        let lo = hist.edges[0];
        let hi = hist.edges[hist.edges.len() - 1];
        let top = hist.counts.iter().copied().max().unwrap_or(1).max(1) as f64;
        let mut chart = ChartBuilder::on(area)
            .caption(&hist.column, ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(25)
            .y_label_area_size(35)
            .build_cartesian_2d(lo..hi.max(lo + 1e-9), 0f64..top * 1.05)
            .map_err(|e| anyhow!("chart build: {}", e))?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .draw()
            .map_err(|e| anyhow!("mesh: {}", e))?;
        chart
            .draw_series(hist.counts.iter().enumerate().map(|(i, c)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], *c as f64)],
                    RGBColor(70, 130, 180).filled(),
                )
            }))
            .map_err(|e| anyhow!("bars: {}", e))?;
    }
    root.present().map_err(|e| anyhow!("present: {}", e))?;
    Ok(())
}

/// Holdout predictions with their interval band and the realized values.
pub fn prediction_intervals(path: &Path, forecast: &Forecast) -> Result<()> {
    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    let rows = &forecast.intervals;
    let (lo, hi) = span(rows.iter().flat_map(|r| [r.lower, r.upper, r.actual]));
    let x_max = rows.iter().map(|r| r.row).max().unwrap_or(1) as f64 + 1.0;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Model {} holdout predictions, {:.3} x residual sd",
                forecast.model_id, forecast.critical_value
            ),
            ("sans-serif", 22),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, lo..hi)
        .map_err(|e| anyhow!("chart build: {}", e))?;
    chart
        .configure_mesh()
        .x_desc("day")
        .draw()
        .map_err(|e| anyhow!("mesh: {}", e))?;

    let grey = RGBColor(150, 150, 150);
    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.row as f64, r.upper)),
            &grey,
        ))
        .map_err(|e| anyhow!("upper band: {}", e))?;
    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.row as f64, r.lower)),
            &grey,
        ))
        .map_err(|e| anyhow!("lower band: {}", e))?;
    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.row as f64, r.predicted)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("prediction: {}", e))?;
    chart
        .draw_series(
            rows.iter()
                .map(|r| Circle::new((r.row as f64, r.actual), 2, RED.filled())),
        )
        .map_err(|e| anyhow!("actuals: {}", e))?;
    root.present().map_err(|e| anyhow!("present: {}", e))?;
    Ok(())
}

/// Write every report plot into `dir`, returning the created paths.
pub fn render_all(
    dir: &Path,
    response_name: &str,
    response: &[f64],
    hists: &[Histogram],
    forecast: &Forecast,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let series = dir.join("response.svg");
    let hist = dir.join("histograms.svg");
    let band = dir.join("forecast.svg");
    response_series(&series, response_name, response)?;
    histograms(&hist, hists)?;
    prediction_intervals(&band, forecast)?;
    Ok(vec![series, hist, band])
}
