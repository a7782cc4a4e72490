//! SVG charts: frequency bar charts and weighted histograms

use std::path::Path;

use anyhow::{bail, Result};
use plotters::prelude::*;
use serde::Serialize;

use crate::pipeline::{numeric_values, FrequencyTable};

const CHART_SIZE: (u32, u32) = (960, 600);
const BAR_COLOR: RGBColor = RGBColor(52, 101, 164);
const MEAN_COLOR: RGBColor = RGBColor(204, 0, 0);

/// One histogram bin `[lower, upper)`; the last bin includes its upper edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    /// Count, or sum of weights when weighted
    pub value: f64,
}

/// Bin a numeric column into `bins` equal-width bins.
///
/// Rows with a missing value or weight are skipped. A constant column gets a
/// single bin of width 1 centred on the value.
pub fn histogram_bins(
    df: &polars::prelude::DataFrame,
    column: &str,
    weight_column: Option<&str>,
    bins: usize,
) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        bail!("Number of histogram bins must be at least 1");
    }

    let values = numeric_values(df, column, "Histogram")?;
    let weights = match weight_column {
        Some(name) => numeric_values(df, name, "Weight")?,
        None => vec![Some(1.0); values.len()],
    };

    let pairs: Vec<(f64, f64)> = values
        .into_iter()
        .zip(weights)
        .filter_map(|(x, w)| match (x, w) {
            (Some(x), Some(w)) if x.is_finite() && w.is_finite() => Some((x, w)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        bail!("Column '{}' has no complete values to plot", column);
    }

    let min = pairs.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let max = pairs.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        let value = pairs.iter().map(|(_, w)| w).sum();
        return Ok(vec![HistogramBin {
            lower: min - 0.5,
            upper: max + 0.5,
            value,
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + i as f64 * width,
            upper: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            value: 0.0,
        })
        .collect();

    for (x, w) in pairs {
        let idx = (((x - min) / width) as usize).min(bins - 1);
        out[idx].value += w;
    }

    Ok(out)
}

/// Render a frequency table as a vertical bar chart.
pub fn render_bar_chart(table: &FrequencyTable, path: &Path, title: &str) -> Result<()> {
    if table.rows.is_empty() {
        bail!("Frequency table for '{}' is empty", table.column);
    }

    let n = table.rows.len();
    let y_max = table.rows.iter().map(|r| r.value).fold(0.0, f64::max);
    let labels: Vec<String> = table.rows.iter().map(|r| r.level.clone()).collect();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..upper_bound(y_max))?;

    let label_of = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_of)
        .x_desc(table.column.as_str())
        .y_desc(if table.weighted { "Weighted total" } else { "Count" })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.mix(0.8).filled())
            .margin(12)
            .data(table.rows.iter().enumerate().map(|(i, r)| (i, r.value))),
    )?;

    root.present()?;
    Ok(())
}

/// Render a histogram of a numeric column with its weighted mean marked.
pub fn render_histogram(
    df: &polars::prelude::DataFrame,
    column: &str,
    weight_column: Option<&str>,
    bins: usize,
    path: &Path,
) -> Result<()> {
    let hist = histogram_bins(df, column, weight_column, bins)?;

    let x_min = hist.first().map(|b| b.lower).unwrap_or(0.0);
    let x_max = hist.last().map(|b| b.upper).unwrap_or(1.0);
    let y_max = hist.iter().map(|b| b.value).fold(0.0, f64::max);
    let total: f64 = hist.iter().map(|b| b.value).sum();
    let mean = hist
        .iter()
        .map(|b| (b.lower + b.upper) / 2.0 * b.value)
        .sum::<f64>()
        / total;

    let title = match weight_column {
        Some(w) => format!("{} (weighted by {})", column, w),
        None => column.to_string(),
    };

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0f64..upper_bound(y_max))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(column)
        .y_desc(if weight_column.is_some() { "Weighted total" } else { "Count" })
        .draw()?;

    chart.draw_series(hist.iter().map(|b| {
        Rectangle::new([(b.lower, 0.0), (b.upper, b.value)], BAR_COLOR.mix(0.8).filled())
    }))?;

    if mean.is_finite() {
        chart.draw_series(LineSeries::new(
            vec![(mean, 0.0), (mean, upper_bound(y_max))],
            MEAN_COLOR.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}

fn upper_bound(y_max: f64) -> f64 {
    if y_max > 0.0 {
        y_max * 1.1
    } else {
        1.0
    }
}
