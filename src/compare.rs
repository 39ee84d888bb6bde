//! Multi-run comparison: shortest-duration trimming and resampling onto a
//! shared elapsed-time axis.
//!
//! Runs are captured at different wall-clock times with different total
//! durations. The shortest run sets the common window; each run is trimmed
//! relative to its own start, then linearly resampled onto one elapsed
//! axis so per-sensor series become comparable sample-for-sample. Points
//! outside a run's measured range resample to missing, never extrapolated.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::encoding::sniff_encoding;
use crate::error::PipelineError;
use crate::header::read_resolved_header;
use crate::loader::{load_window, CancelToken, LoadOptions};
use crate::timestamp::parse_bound;

/// Manifest describing a saved comparison: which runs, which sensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareManifest {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    /// Trim strategy tag; currently always `elapsed_duration_shortest`.
    pub trim: String,
    /// Run folder paths relative to the runs root.
    pub runs: Vec<String>,
    pub sensors: Vec<String>,
}

impl CompareManifest {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            PipelineError::InvalidWindow(format!("malformed compare manifest: {e}"))
        })
    }
}

/// One run's windowed data, loaded back from its exported slice CSV.
#[derive(Debug, Clone, Default)]
pub struct RunFrame {
    pub label: String,
    /// Per-row timestamps; `None` means the run only has positional order.
    pub timestamps: Option<Vec<NaiveDateTime>>,
    /// Requested sensor names, in request order.
    pub sensors: Vec<String>,
    /// One numeric series per sensor, parallel to `sensors`.
    pub series: Vec<Vec<Option<f64>>>,
}

impl RunFrame {
    pub fn row_count(&self) -> usize {
        match &self.timestamps {
            Some(ts) => ts.len(),
            None => self.series.first().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    fn duration_seconds(&self) -> Option<f64> {
        let ts = self.timestamps.as_ref()?;
        let min = ts.iter().min()?;
        let max = ts.iter().max()?;
        Some((*max - *min).num_milliseconds() as f64 / 1000.0)
    }

    /// Elapsed seconds from this run's own start; positional axis when
    /// the run has no timestamps.
    pub fn elapsed_axis(&self) -> Vec<f64> {
        match &self.timestamps {
            Some(ts) if !ts.is_empty() => {
                let t0 = ts.iter().min().copied().unwrap_or(ts[0]);
                ts.iter()
                    .map(|t| (*t - t0).num_milliseconds() as f64 / 1000.0)
                    .collect()
            }
            _ => (0..self.row_count()).map(|i| i as f64).collect(),
        }
    }

    fn truncated(&self, rows: usize) -> Self {
        Self {
            label: self.label.clone(),
            timestamps: self.timestamps.as_ref().map(|ts| ts[..rows.min(ts.len())].to_vec()),
            sensors: self.sensors.clone(),
            series: self
                .series
                .iter()
                .map(|s| s[..rows.min(s.len())].to_vec())
                .collect(),
        }
    }

    /// Load a run's exported `run_window.csv`, keeping only the requested
    /// sensors (missing sensors become all-missing series).
    ///
    /// The file goes back through the same header-resolution path that
    /// produced it, so the column name space round-trips identically.
    pub fn load(path: &Path, label: &str, sensors: &[String]) -> Result<Self, PipelineError> {
        let encoding = sniff_encoding(path);
        let header = read_resolved_header(path, encoding)?;
        let slice = load_window(
            path,
            &header,
            encoding,
            None,
            &LoadOptions::default(),
            &CancelToken::new(),
        )?;
        let frame = slice.frame;

        let timestamps = if frame.has_time_columns() {
            frame.timestamps()
        } else {
            // Tolerate a single leading datetime column.
            frame.column_names().first().and_then(|first| {
                let cells = frame.text(first)?;
                let parsed: Vec<Option<NaiveDateTime>> =
                    cells.iter().map(|c| parse_bound(c)).collect();
                parsed.iter().any(Option::is_some).then_some(parsed)
            })
        };

        // Rows without a parseable timestamp cannot sit on a time axis.
        let keep: Vec<usize> = match &timestamps {
            Some(ts) => (0..frame.row_count()).filter(|i| ts[*i].is_some()).collect(),
            None => (0..frame.row_count()).collect(),
        };

        let kept_timestamps = timestamps.map(|ts| {
            keep.iter()
                .filter_map(|i| ts[*i])
                .collect::<Vec<NaiveDateTime>>()
        });

        let series = sensors
            .iter()
            .map(|sensor| match frame.numeric(sensor) {
                Some(values) => keep.iter().map(|i| values[*i]).collect(),
                None => vec![None; keep.len()],
            })
            .collect();

        Ok(Self {
            label: label.to_string(),
            timestamps: kept_timestamps,
            sensors: sensors.to_vec(),
            series,
        })
    }
}

/// Trim all runs to the shortest common elapsed duration.
///
/// Empty runs keep their positional placeholder. When every non-empty run
/// carries timestamps, each is trimmed to `[own start, own start + d]`
/// where `d` is the minimum (max-min) duration. Otherwise all runs are
/// trimmed uniformly to the minimum row count; the strategies are never
/// mixed per-run.
pub fn trim_to_shortest_duration(runs: Vec<RunFrame>) -> Vec<RunFrame> {
    let non_empty: Vec<&RunFrame> = runs.iter().filter(|r| !r.is_empty()).collect();
    if non_empty.is_empty() {
        return runs;
    }

    let all_timestamped = non_empty.iter().all(|r| r.timestamps.is_some());

    if all_timestamped {
        let min_duration = non_empty
            .iter()
            .filter_map(|r| r.duration_seconds())
            .fold(f64::INFINITY, f64::min);
        if !min_duration.is_finite() {
            return runs;
        }
        return runs
            .into_iter()
            .map(|run| {
                if run.is_empty() {
                    return run;
                }
                let axis = run.elapsed_axis();
                let rows = axis.iter().take_while(|e| **e <= min_duration).count();
                run.truncated(rows)
            })
            .collect();
    }

    let min_rows = non_empty.iter().map(|r| r.row_count()).min().unwrap_or(0);
    if min_rows == 0 {
        return runs;
    }
    runs.into_iter()
        .map(|run| {
            if run.is_empty() {
                run
            } else {
                run.truncated(min_rows)
            }
        })
        .collect()
}

/// Comparison series projected onto one shared elapsed axis.
#[derive(Debug)]
pub struct AlignedRuns {
    /// Shared elapsed-seconds axis, `min_len` evenly spaced points.
    pub elapsed: Vec<f64>,
    pub labels: Vec<String>,
    pub sensors: Vec<String>,
    /// `values[sensor][run][point]`, missing outside a run's measured range.
    pub values: Vec<Vec<Vec<Option<f64>>>>,
}

/// Resample trimmed runs onto a common elapsed axis via linear
/// interpolation against each run's own axis.
///
/// Returns `None` when fewer than two shared points exist. Runs with fewer
/// than two finite samples for a sensor yield an all-missing series.
pub fn resample_runs(runs: &[RunFrame], sensors: &[String]) -> Option<AlignedRuns> {
    let non_empty: Vec<&RunFrame> = runs.iter().filter(|r| !r.is_empty()).collect();
    if non_empty.is_empty() {
        return None;
    }

    let min_len = non_empty.iter().map(|r| r.row_count()).min()?;
    if min_len < 2 {
        return None;
    }

    let all_timestamped = non_empty.iter().all(|r| r.timestamps.is_some());
    let min_dur_sec = if all_timestamped {
        non_empty
            .iter()
            .filter_map(|r| r.duration_seconds())
            .fold(f64::INFINITY, f64::min)
    } else {
        (min_len - 1) as f64
    };
    if !min_dur_sec.is_finite() {
        return None;
    }

    let elapsed: Vec<f64> = (0..min_len)
        .map(|i| min_dur_sec * i as f64 / (min_len - 1) as f64)
        .collect();

    let values: Vec<Vec<Vec<Option<f64>>>> = sensors
        .iter()
        .enumerate()
        .map(|(sensor_idx, _)| {
            runs.iter()
                .map(|run| {
                    if run.is_empty() {
                        return vec![None; min_len];
                    }
                    let axis = run.elapsed_axis();
                    let series = run
                        .series
                        .get(sensor_idx)
                        .cloned()
                        .unwrap_or_else(|| vec![None; run.row_count()]);
                    interpolate(&axis, &series, &elapsed)
                })
                .collect()
        })
        .collect();

    Some(AlignedRuns {
        elapsed,
        labels: runs.iter().map(|r| r.label.clone()).collect(),
        sensors: sensors.to_vec(),
        values,
    })
}

/// Linear interpolation of `(xs, ys)` sampled at `targets`; outside the
/// finite sample range the result is missing rather than extrapolated.
fn interpolate(xs: &[f64], ys: &[Option<f64>], targets: &[f64]) -> Vec<Option<f64>> {
    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| y.map(|y| (*x, y)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if points.len() < 2 {
        return vec![None; targets.len()];
    }

    targets
        .iter()
        .map(|t| {
            let first = points[0];
            let last = points[points.len() - 1];
            if *t < first.0 || *t > last.0 {
                return None;
            }
            let idx = points.partition_point(|(x, _)| *x < *t);
            if idx == 0 {
                return Some(first.1);
            }
            let (x0, y0) = points[idx - 1];
            let (x1, y1) = points[idx];
            if x1 == x0 {
                return Some(y0);
            }
            Some(y0 + (y1 - y0) * (*t - x0) / (x1 - x0))
        })
        .collect()
}

/// Disambiguate duplicate display labels by appending ` #2`, ` #3`, ...
pub fn dedup_labels(labels: &[String]) -> Vec<String> {
    let mut used: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
    labels
        .iter()
        .map(|label| {
            let n = used.entry(label.as_str()).or_insert(0);
            *n += 1;
            if *n == 1 {
                label.clone()
            } else {
                format!("{label} #{n}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            + chrono::Duration::seconds(s as i64)
    }

    fn timestamped_run(label: &str, start_s: u32, duration_s: u32) -> RunFrame {
        let timestamps: Vec<NaiveDateTime> = (0..=duration_s).map(|i| ts(10, 0, start_s + i)).collect();
        let series = vec![timestamps.iter().enumerate().map(|(i, _)| Some(i as f64)).collect()];
        RunFrame {
            label: label.to_string(),
            timestamps: Some(timestamps),
            sensors: vec!["CPU Package [°C]".to_string()],
            series,
        }
    }

    fn positional_run(label: &str, rows: usize) -> RunFrame {
        RunFrame {
            label: label.to_string(),
            timestamps: None,
            sensors: vec!["CPU Package [°C]".to_string()],
            series: vec![(0..rows).map(|i| Some(i as f64)).collect()],
        }
    }

    #[test]
    fn test_shortest_duration_sets_common_window() {
        // Durations 300s, 280s, 310s: every output spans exactly 280s from
        // its own start.
        let runs = vec![
            timestamped_run("a", 0, 300),
            timestamped_run("b", 5, 280),
            timestamped_run("c", 2, 310),
        ];
        let trimmed = trim_to_shortest_duration(runs);
        for run in &trimmed {
            let axis = run.elapsed_axis();
            assert!((axis.last().copied().unwrap() - 280.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_runs_keep_their_slot() {
        let runs = vec![
            timestamped_run("a", 0, 10),
            RunFrame::default(),
            timestamped_run("c", 0, 5),
        ];
        let trimmed = trim_to_shortest_duration(runs);
        assert_eq!(trimmed.len(), 3);
        assert!(trimmed[1].is_empty());
        assert_eq!(trimmed[0].row_count(), 6);
        assert_eq!(trimmed[2].row_count(), 6);
    }

    #[test]
    fn test_row_count_fallback_applies_uniformly() {
        // One run without timestamps forces row-count trimming for all.
        let runs = vec![
            timestamped_run("a", 0, 10),
            positional_run("b", 4),
        ];
        let trimmed = trim_to_shortest_duration(runs);
        assert_eq!(trimmed[0].row_count(), 4);
        assert_eq!(trimmed[1].row_count(), 4);
    }

    #[test]
    fn test_resample_projects_onto_common_axis() {
        let runs = vec![timestamped_run("a", 0, 4), timestamped_run("b", 0, 4)];
        let sensors = vec!["CPU Package [°C]".to_string()];
        let aligned = resample_runs(&runs, &sensors).unwrap();
        assert_eq!(aligned.elapsed.len(), 5);
        assert!((aligned.elapsed[4] - 4.0).abs() < 1e-9);
        // Identity data on an identity axis resamples to itself.
        assert_eq!(aligned.values[0][0][2], Some(2.0));
    }

    #[test]
    fn test_resample_never_extrapolates() {
        let mut short = timestamped_run("short", 0, 2);
        // Last sample missing: finite range ends at 1s although the run
        // spans 2s.
        short.series[0][2] = None;
        let long = timestamped_run("long", 0, 2);
        let sensors = vec!["CPU Package [°C]".to_string()];
        let aligned = resample_runs(&[short, long], &sensors).unwrap();
        let short_series = &aligned.values[0][0];
        assert_eq!(short_series[0], Some(0.0));
        assert_eq!(short_series.last().copied().unwrap(), None);
    }

    #[test]
    fn test_resample_requires_two_points() {
        let runs = vec![positional_run("tiny", 1)];
        assert!(resample_runs(&runs, &["CPU Package [°C]".to_string()]).is_none());
    }

    #[test]
    fn test_missing_sensor_resamples_to_all_missing() {
        let runs = vec![timestamped_run("a", 0, 4)];
        let sensors = vec!["GPU Temperature [°C]".to_string()];
        let mut runs = runs;
        runs[0].sensors = sensors.clone();
        runs[0].series = vec![vec![None; 5]];
        let aligned = resample_runs(&runs, &sensors).unwrap();
        assert!(aligned.values[0][0].iter().all(Option::is_none));
    }

    #[test]
    fn test_dedup_labels() {
        let labels: Vec<String> = ["case1 CPU", "case1 CPU", "case2 GPU", "case1 CPU"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            dedup_labels(&labels),
            vec!["case1 CPU", "case1 CPU #2", "case2 GPU", "case1 CPU #3"]
        );
    }

    #[test]
    fn test_interpolate_midpoints() {
        let xs = [0.0, 2.0];
        let ys = [Some(10.0), Some(30.0)];
        let out = interpolate(&xs, &ys, &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(out, vec![Some(10.0), Some(20.0), Some(30.0), None]);
    }
}
