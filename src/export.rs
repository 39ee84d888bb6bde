//! Output artifacts: windowed slice CSV, ambient audit CSV, window-check
//! report and per-series summary statistics.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::ambient::AmbientSeries;
use crate::error::PipelineError;
use crate::frame::{ColumnData, SensorFrame, DATE_COLUMN, TIME_COLUMN};
use crate::loader::WindowSlice;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Write `run_window.csv`: `Date`, `Time`, then every selected column that
/// exists in the frame, in selection order.
pub fn write_run_window(
    out_dir: &Path,
    frame: &SensorFrame,
    selected: &[String],
) -> Result<(), PipelineError> {
    let mut columns: Vec<&str> = Vec::new();
    for reserved in [DATE_COLUMN, TIME_COLUMN] {
        if frame.has_column(reserved) {
            columns.push(reserved);
        }
    }
    for name in selected {
        if frame.has_column(name) && !columns.contains(&name.as_str()) {
            columns.push(name);
        }
    }

    let mut writer = csv::Writer::from_path(out_dir.join("run_window.csv"))?;
    writer.write_record(&columns)?;

    let cells: Vec<&ColumnData> = columns
        .iter()
        .filter_map(|name| frame.column(name))
        .collect();
    for row in 0..frame.row_count() {
        let record: Vec<String> = cells
            .iter()
            .map(|column| match column {
                ColumnData::Text(values) => values[row].clone(),
                ColumnData::Float(values) => {
                    values[row].map(|v| v.to_string()).unwrap_or_default()
                }
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `ambient_window.csv`: the padded ambient slice used for merging,
/// kept for traceability.
pub fn write_ambient_window(out_dir: &Path, slice: &AmbientSeries) -> Result<(), PipelineError> {
    if slice.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(out_dir.join("ambient_window.csv"))?;
    writer.write_record(["timestamp", "ambient_c"])?;
    for sample in slice.samples() {
        writer.write_record([
            format_ts(sample.timestamp),
            sample.value.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `window_check.txt`: requested vs. actual window bounds and row
/// count, for diagnosing empty-window support cases.
pub fn write_window_check(
    out_dir: &Path,
    requested_start: &str,
    requested_end: &str,
    slice: &WindowSlice,
) -> Result<(), PipelineError> {
    let lines = [
        format!("window_start_requested={requested_start}"),
        format!("window_end_requested={requested_end}"),
        format!("rows_in_slice={}", slice.rows_in_slice),
        format!(
            "first_timestamp_in_slice={}",
            slice.first_ts.map(format_ts).unwrap_or_default()
        ),
        format!(
            "last_timestamp_in_slice={}",
            slice.last_ts.map(format_ts).unwrap_or_default()
        ),
    ];
    fs::write(out_dir.join("window_check.txt"), lines.join("\n") + "\n")?;
    Ok(())
}

/// Summary statistics for one selected series.
#[derive(Debug, PartialEq)]
pub struct SeriesSummary {
    pub sensor: String,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Compute per-series min/max/avg over the numeric samples. Series with
/// fewer than two numeric samples are skipped.
pub fn summarize(frame: &SensorFrame, selected: &[String]) -> Vec<SeriesSummary> {
    let mut out = Vec::new();
    for name in selected {
        let Some(values) = frame.numeric(name) else {
            continue;
        };
        let numeric: Vec<f64> = values.into_iter().flatten().collect();
        if numeric.len() < 2 {
            continue;
        }
        let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = numeric.iter().sum::<f64>() / numeric.len() as f64;
        out.push(SeriesSummary {
            sensor: name.clone(),
            min,
            max,
            avg,
        });
    }
    out
}

/// Write `summary.csv`: one row per selected series with `sensor,min,max,avg`.
pub fn write_summary(
    out_dir: &Path,
    frame: &SensorFrame,
    selected: &[String],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(out_dir.join("summary.csv"))?;
    writer.write_record(["sensor", "min", "max", "avg"])?;
    for summary in summarize(frame, selected) {
        writer.write_record([
            summary.sensor,
            summary.min.to_string(),
            summary.max.to_string(),
            summary.avg.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
