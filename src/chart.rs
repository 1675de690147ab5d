//! Result Shaper - normalizes result sets into chart series and renders them
//!
//! Visual mode only. Rows become labeled numeric points, the points become a
//! bar chart PNG, and the final SQL is flattened into a single bounded line
//! safe to carry in a response header.

use crate::db::ResultRow;
use crate::error::{PipelineError, PipelineResult};
use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::prelude::*;
use regex::Regex;
use std::io::Cursor;

/// Maximum label length in characters
const MAX_LABEL_CHARS: usize = 40;
/// Maximum number of bars rendered
const MAX_POINTS: usize = 30;
/// Maximum sanitized header length before truncation
const MAX_HEADER_CHARS: usize = 800;

const CHART_WIDTH: u32 = 1600;
const CHART_HEIGHT: u32 = 800;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// One bar of the chart
#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Reduce a result set to at most [`MAX_POINTS`] labeled values, sorted by
/// value descending.
///
/// If the rows carry columns named exactly `label` and `value` those are
/// used; otherwise the first two columns are taken positionally, in their
/// original order. Labels are truncated to [`MAX_LABEL_CHARS`] characters.
/// A value with no numeric reading becomes zero rather than dropping the row.
pub fn shape_series(rows: &[ResultRow]) -> PipelineResult<Vec<ChartPoint>> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let named = rows[0].get("label").is_some() && rows[0].get("value").is_some();
    if !named && rows[0].columns.len() < 2 {
        return Err(PipelineError::ChartRender(
            "result needs label and value columns".to_string(),
        ));
    }

    let mut points: Vec<ChartPoint> = rows
        .iter()
        .map(|row| {
            let (label_value, value_value) = if named {
                (row.get("label"), row.get("value"))
            } else {
                (row.value_at(0), row.value_at(1))
            };

            let label: String = label_value
                .map(|v| v.to_label())
                .unwrap_or_default()
                .chars()
                .take(MAX_LABEL_CHARS)
                .collect();
            let value = value_value.and_then(|v| v.as_number()).unwrap_or(0.0);

            ChartPoint { label, value }
        })
        .collect();

    points.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    points.truncate(MAX_POINTS);

    Ok(points)
}

/// Render the series as a bar chart PNG titled with the original question.
pub fn render_bar_chart(points: &[ChartPoint], question: &str) -> PipelineResult<Vec<u8>> {
    let mut pixels = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
    let max_value = points.iter().map(|p| p.value).fold(f64::MIN, f64::max);
    let min_value = points.iter().map(|p| p.value).fold(0.0, f64::min);
    let y_top = if max_value <= 0.0 { 1.0 } else { max_value * 1.05 };

    {
        let root =
            BitMapBackend::with_buffer(&mut pixels, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PipelineError::ChartRender(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(question, ("sans-serif", 30))
            .margin(16)
            .x_label_area_size(140)
            .y_label_area_size(80)
            .build_cartesian_2d(0i32..points.len() as i32, min_value..y_top)
            .map_err(|e| PipelineError::ChartRender(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(points.len())
            .x_label_formatter(&|idx: &i32| {
                labels
                    .get(*idx as usize)
                    .map(|l| l.to_string())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(|e| PipelineError::ChartRender(e.to_string()))?;

        chart
            .draw_series(points.iter().enumerate().map(|(i, point)| {
                Rectangle::new(
                    [(i as i32, 0.0), (i as i32 + 1, point.value)],
                    BLUE.filled(),
                )
            }))
            .map_err(|e| PipelineError::ChartRender(e.to_string()))?;

        root.present()
            .map_err(|e| PipelineError::ChartRender(e.to_string()))?;
    }

    let img = RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, pixels)
        .ok_or_else(|| PipelineError::ChartRender("buffer size mismatch".to_string()))?;
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| PipelineError::ChartRender(e.to_string()))?;

    Ok(png.into_inner())
}

/// Flatten SQL into a single bounded line for transport as a response header.
/// Carriage returns and newlines become spaces, whitespace runs collapse, and
/// text beyond [`MAX_HEADER_CHARS`] characters is truncated with an ellipsis
/// marker. This protects the transport layer from header-injection characters
/// and unbounded length.
pub fn sanitize_header_value(sql: &str) -> String {
    let flattened = sql.replace(['\r', '\n'], " ");
    let collapsed = WHITESPACE_RUN.replace_all(&flattened, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > MAX_HEADER_CHARS {
        let cut: String = trimmed.chars().take(MAX_HEADER_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
