//! Ambient temperature side-stream: tolerant load and nearest-timestamp
//! merge into the primary telemetry frame.
//!
//! The ambient logger samples a USB probe at its own irregular cadence, so
//! alignment is a nearest-neighbor join with a hard tolerance cutoff, not
//! interpolation. Partial coverage is expected: rows without a close-enough
//! ambient sample merge to missing.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use log::debug;

use crate::error::PipelineError;
use crate::frame::SensorFrame;
use crate::timestamp::parse_bound;
use crate::window::Window;

/// Default maximum gap between a telemetry row and its ambient sample.
pub const DEFAULT_TOLERANCE_SECONDS: f64 = 2.0;

/// One ambient reading. The value is missing when the logger recorded a
/// failed read (blank cell kept for cadence).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSample {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

/// Ambient samples sorted by timestamp.
#[derive(Debug, Clone, Default)]
pub struct AmbientSeries {
    samples: Vec<AmbientSample>,
}

impl AmbientSeries {
    pub fn samples(&self) -> &[AmbientSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Load an ambient log CSV.
    ///
    /// Header is tolerant: `timestamp`/`time`/`datetime` for the time
    /// column, `ambient_c`/`ambient`/`value` for the value column. Rows
    /// with unparseable timestamps are dropped; blank values are kept as
    /// missing. A calibration offset, when given, is subtracted from every
    /// reading.
    pub fn load(path: &Path, calibration_offset_c: Option<f64>) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let ts_idx = find_column(&headers, &["timestamp", "time", "datetime"]);
        let value_idx = find_column(&headers, &["ambient_c", "ambient", "value"]);
        let (Some(ts_idx), Some(value_idx)) = (ts_idx, value_idx) else {
            return Ok(Self::default());
        };

        let mut samples = Vec::new();
        for record in reader.records() {
            let record = record?;
            let Some(timestamp) = record.get(ts_idx).and_then(parse_bound_field) else {
                continue;
            };
            let value = record
                .get(value_idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|v| v - calibration_offset_c.unwrap_or(0.0));
            samples.push(AmbientSample { timestamp, value });
        }
        samples.sort_by_key(|s| s.timestamp);
        Ok(Self { samples })
    }

    /// Restrict to `[start - tolerance, end + tolerance]`. The pad lets
    /// boundary rows of the primary window still find a nearby sample just
    /// outside the strict window.
    fn restrict(&self, window: Window, tolerance: Duration) -> Self {
        let lo = window.start - tolerance;
        let hi = window.end + tolerance;
        Self {
            samples: self
                .samples
                .iter()
                .filter(|s| lo <= s.timestamp && s.timestamp <= hi)
                .copied()
                .collect(),
        }
    }

    /// Nearest sample to `ts` by absolute time difference, within
    /// `tolerance`. Binary search over the sorted samples.
    fn nearest_within(&self, ts: NaiveDateTime, tolerance: Duration) -> Option<AmbientSample> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = self.samples.partition_point(|s| s.timestamp < ts);
        let before = idx.checked_sub(1).map(|i| self.samples[i]);
        let after = self.samples.get(idx).copied();

        let best = match (before, after) {
            (Some(b), Some(a)) => {
                if ts - b.timestamp <= a.timestamp - ts {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        let gap = if best.timestamp >= ts {
            best.timestamp - ts
        } else {
            ts - best.timestamp
        };
        (gap <= tolerance).then_some(best)
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|wanted| headers.iter().position(|h| h == wanted))
}

fn parse_bound_field(s: &str) -> Option<NaiveDateTime> {
    parse_bound(s.trim())
}

/// Merge ambient readings into the primary frame by nearest timestamp.
///
/// Appends a full-length column named `output_column` aligned by original
/// row index; rows with unparseable primary timestamps or no ambient sample
/// within tolerance receive a missing value. Returns the padded ambient
/// slice used, for audit export. All the no-op conditions (empty frame,
/// empty ambient, missing time columns, nothing in the padded window)
/// return an empty slice and leave the frame unchanged.
pub fn merge_ambient(
    frame: &mut SensorFrame,
    ambient: &AmbientSeries,
    window: Option<Window>,
    output_column: &str,
    tolerance_seconds: f64,
) -> AmbientSeries {
    if frame.is_empty() || ambient.is_empty() || !frame.has_time_columns() {
        return AmbientSeries::default();
    }
    let Some(timestamps) = frame.timestamps() else {
        return AmbientSeries::default();
    };
    if !timestamps.iter().any(Option::is_some) {
        return AmbientSeries::default();
    }

    let tolerance = Duration::milliseconds((tolerance_seconds * 1000.0).round() as i64);

    let restricted = match window {
        Some(w) => ambient.restrict(w, tolerance),
        None => ambient.clone(),
    };
    if restricted.is_empty() {
        return AmbientSeries::default();
    }

    let merged: Vec<Option<f64>> = timestamps
        .iter()
        .map(|ts| {
            ts.and_then(|t| restricted.nearest_within(t, tolerance))
                .and_then(|s| s.value)
        })
        .collect();

    let hits = merged.iter().filter(|v| v.is_some()).count();
    debug!(
        "ambient merge: {hits}/{} rows matched within {tolerance_seconds}s",
        merged.len()
    );

    frame.add_float_column(output_column, merged);
    restricted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ts(h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    fn series(points: &[(NaiveDateTime, Option<f64>)]) -> AmbientSeries {
        let mut samples: Vec<AmbientSample> = points
            .iter()
            .map(|(timestamp, value)| AmbientSample {
                timestamp: *timestamp,
                value: *value,
            })
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        AmbientSeries { samples }
    }

    fn primary_frame(times: &[&str]) -> SensorFrame {
        let mut frame = SensorFrame::new(vec![
            "Date".into(),
            "Time".into(),
            "CPU Package [°C]".into(),
        ]);
        for t in times {
            frame.push_row(&["01.02.2024", t, "40.0"]);
        }
        frame
    }

    #[test]
    fn test_nearest_outside_tolerance_is_missing() {
        // Primary row at t=100.0s, ambient at 97.9s and 102.1s: both more
        // than 2s away, so the row merges to missing.
        let mut frame = primary_frame(&["10:01:40.000"]);
        let ambient = series(&[
            (ts(10, 1, 37, 900), Some(21.0)),
            (ts(10, 1, 42, 100), Some(22.0)),
        ]);
        merge_ambient(&mut frame, &ambient, None, "Ambient [°C]", 2.0);
        assert_eq!(frame.numeric("Ambient [°C]").unwrap(), vec![None]);
    }

    #[test]
    fn test_nearest_within_tolerance_merges() {
        let mut frame = primary_frame(&["10:01:40.000"]);
        let ambient = series(&[
            (ts(10, 1, 38, 500), Some(21.0)),
            (ts(10, 1, 44, 0), Some(25.0)),
        ]);
        merge_ambient(&mut frame, &ambient, None, "Ambient [°C]", 2.0);
        assert_eq!(frame.numeric("Ambient [°C]").unwrap(), vec![Some(21.0)]);
    }

    #[test]
    fn test_ties_prefer_earlier_sample() {
        let mut frame = primary_frame(&["10:00:01.000"]);
        let ambient = series(&[
            (ts(10, 0, 0, 0), Some(20.0)),
            (ts(10, 0, 2, 0), Some(30.0)),
        ]);
        merge_ambient(&mut frame, &ambient, None, "Ambient [°C]", 2.0);
        assert_eq!(frame.numeric("Ambient [°C]").unwrap(), vec![Some(20.0)]);
    }

    #[test]
    fn test_window_restriction_is_padded_by_tolerance() {
        let mut frame = primary_frame(&["10:00:00.000", "10:00:05.000"]);
        let window = Window::new(ts(10, 0, 0, 0), ts(10, 0, 5, 0)).unwrap();
        // 09:59:58.5 is outside the strict window but inside the pad, and
        // within tolerance of the first row.
        let ambient = series(&[
            (ts(9, 59, 58, 500), Some(19.5)),
            (ts(10, 0, 30, 0), Some(23.0)),
        ]);
        let slice = merge_ambient(&mut frame, &ambient, Some(window), "Ambient [°C]", 2.0);
        assert_eq!(slice.len(), 1);
        assert_eq!(
            frame.numeric("Ambient [°C]").unwrap(),
            vec![Some(19.5), None]
        );
    }

    #[test]
    fn test_empty_restriction_is_noop() {
        let mut frame = primary_frame(&["10:00:00.000"]);
        let window = Window::new(ts(10, 0, 0, 0), ts(10, 0, 5, 0)).unwrap();
        let ambient = series(&[(ts(12, 0, 0, 0), Some(23.0))]);
        let slice = merge_ambient(&mut frame, &ambient, Some(window), "Ambient [°C]", 2.0);
        assert!(slice.is_empty());
        assert!(!frame.has_column("Ambient [°C]"));
    }

    #[test]
    fn test_empty_inputs_are_noops() {
        let mut empty_frame = SensorFrame::new(vec!["Date".into(), "Time".into()]);
        let ambient = series(&[(ts(10, 0, 0, 0), Some(20.0))]);
        assert!(merge_ambient(&mut empty_frame, &ambient, None, "A", 2.0).is_empty());

        let mut frame = primary_frame(&["10:00:00.000"]);
        assert!(merge_ambient(&mut frame, &AmbientSeries::default(), None, "A", 2.0).is_empty());
        assert!(!frame.has_column("A"));
    }

    #[test]
    fn test_failed_reads_stay_missing_after_merge() {
        let mut frame = primary_frame(&["10:00:00.000"]);
        let ambient = series(&[(ts(10, 0, 0, 200), None)]);
        merge_ambient(&mut frame, &ambient, None, "Ambient [°C]", 2.0);
        assert_eq!(frame.numeric("Ambient [°C]").unwrap(), vec![None]);
    }

    #[test]
    fn test_load_tolerant_headers_and_blank_values() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Time,Value").unwrap();
        writeln!(f, "2024-02-01 10:00:00.000,21.5").unwrap();
        writeln!(f, "2024-02-01 10:00:01.000,").unwrap();
        writeln!(f, "not a timestamp,22.0").unwrap();
        f.flush().unwrap();

        let series = AmbientSeries::load(f.path(), None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.samples()[0].value, Some(21.5));
        assert_eq!(series.samples()[1].value, None);
    }

    #[test]
    fn test_load_applies_calibration_offset() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "timestamp,ambient_c").unwrap();
        writeln!(f, "2024-02-01 10:00:00.000,25.0").unwrap();
        f.flush().unwrap();

        let series = AmbientSeries::load(f.path(), Some(4.0)).unwrap();
        assert_eq!(series.samples()[0].value, Some(21.0));
    }

    #[test]
    fn test_load_unrecognized_headers_yields_empty() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "foo,bar").unwrap();
        writeln!(f, "1,2").unwrap();
        f.flush().unwrap();
        assert!(AmbientSeries::load(f.path(), None).unwrap().is_empty());
    }
}
