//! Report aggregation over raw measurement rows.
//!
//! Turns the store's descending row list into the structures a renderer
//! needs: a capped table view, a downsampled chart series, an optional
//! pressure series, summary statistics, and the report's date span. All of
//! it is best-effort; an empty store yields an empty-state report, never an
//! error.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::annotation::{extract_labeled_reading, split_reading_pair};
use crate::constants::{
    CHART_POINT_LIMIT, MIN_PRESSURE_POINTS, PRESSURE_LABEL, TABLE_ROW_LIMIT,
};
use crate::measurement::Measurement;

/// Summary statistics over the entire value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    /// Arithmetic mean rounded to one decimal place.
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// All-zero statistics for an empty series.
    #[must_use]
    pub const fn empty() -> Self {
        Self { total: 0, avg: 0.0, min: 0.0, max: 0.0 }
    }
}

/// Computes count, mean (1 decimal), min, and max. Empty input yields zeros.
#[must_use]
pub fn summarize(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::empty();
    }
    let sum: f64 = values.iter().sum();
    let avg = (sum / values.len() as f64 * 10.0).round() / 10.0;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    SummaryStats { total: values.len(), avg, min, max }
}

/// One row of the tabular report view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub date: String,
    pub time: String,
    pub value: f64,
    /// Extracted pressure reading, `"-"` when the note carries none.
    pub pressure: String,
}

/// One chart-ready point: value plus a compact date/time label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Chronological systolic/diastolic series for the pressure chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PressureSeries {
    pub labels: Vec<String>,
    pub systolic: Vec<i64>,
    pub diastolic: Vec<i64>,
}

/// Everything the external renderer needs to draw a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub table: Vec<TableRow>,
    pub stats: SummaryStats,
    pub chart: Vec<ChartPoint>,
    pub pressure: Option<PressureSeries>,
    pub start_date: String,
    pub end_date: String,
}

fn chart_label(t: &NaiveDateTime) -> String {
    format!("{}\n{}", t.format("%d.%m"), t.format("%H:%M"))
}

/// Keeps the most recent `limit` points of a chronological series.
#[must_use]
pub fn downsample<T: Clone>(points: &[T], limit: usize) -> Vec<T> {
    let start = points.len().saturating_sub(limit);
    points[start..].to_vec()
}

/// Builds the full report from raw rows.
///
/// `rows` arrive in the store's descending order; the chronological view is
/// re-sorted ascending internally. `now` supplies the date span for an empty
/// store.
#[must_use]
pub fn build_report(rows: &[Measurement], now: NaiveDateTime) -> Report {
    let table = rows
        .iter()
        .take(TABLE_ROW_LIMIT)
        .map(|m| TableRow {
            date: m.created_at.format("%Y-%m-%d").to_string(),
            time: m.created_at.format("%H:%M").to_string(),
            value: m.value,
            pressure: extract_labeled_reading(&m.note, PRESSURE_LABEL)
                .unwrap_or_else(|| "-".to_owned()),
        })
        .collect();

    let mut chronological: Vec<&Measurement> = rows.iter().collect();
    chronological.sort_by_key(|m| (m.created_at, m.id));

    let chart = downsample(&chronological, CHART_POINT_LIMIT)
        .into_iter()
        .map(|m| ChartPoint { label: chart_label(&m.created_at), value: m.value })
        .collect();

    let mut pressure = PressureSeries {
        labels: Vec::new(),
        systolic: Vec::new(),
        diastolic: Vec::new(),
    };
    for m in &chronological {
        let Some(reading) = extract_labeled_reading(&m.note, PRESSURE_LABEL) else {
            continue;
        };
        let Some((systolic, diastolic)) = split_reading_pair(&reading) else {
            continue;
        };
        pressure.labels.push(chart_label(&m.created_at));
        pressure.systolic.push(systolic);
        pressure.diastolic.push(diastolic);
    }
    let pressure = (pressure.systolic.len() >= MIN_PRESSURE_POINTS).then_some(pressure);

    let values: Vec<f64> = chronological.iter().map(|m| m.value).collect();
    let stats = summarize(&values);

    let today = now.format("%Y-%m-%d").to_string();
    let start_date = chronological
        .first()
        .map_or_else(|| today.clone(), |m| m.created_at.format("%Y-%m-%d").to_string());
    let end_date = chronological
        .last()
        .map_or(today, |m| m.created_at.format("%Y-%m-%d").to_string());

    Report { table, stats, chart, pressure, start_date, end_date }
}
