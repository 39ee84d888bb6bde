//! Chunked streaming window extraction from a growing telemetry CSV.
//!
//! The source file is written by an external hardware monitor and may be
//! appended to while we read, so the loader is strictly read-only, reads
//! sequentially in fixed-size row chunks, and never errors merely because
//! more bytes appeared. Once any parsed timestamp passes the window end the
//! file's time ordering lets us stop after finishing the current chunk.
//!
//! Cancellation is cooperative: the token is checked between chunks only,
//! so a host process can interleave cancellation without the loader ever
//! blocking it indefinitely.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use log::debug;

use crate::encoding::{open_decoded, SourceEncoding};
use crate::error::PipelineError;
use crate::frame::{SensorFrame, DATE_COLUMN, TIME_COLUMN};
use crate::header::is_placeholder;
use crate::timestamp::parse_timestamps;
use crate::window::Window;

/// Default number of physical data rows per chunk.
pub const DEFAULT_CHUNK_ROWS: usize = 25_000;

/// Tuning knobs for the streaming loader.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Physical data rows per chunk.
    pub chunk_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

/// Cloneable cooperative-cancellation flag checked at chunk boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Result of a windowed load: the kept rows plus audit metadata for the
/// window-check report.
#[derive(Debug)]
pub struct WindowSlice {
    pub frame: SensorFrame,
    /// Earliest parsed in-window timestamp.
    pub first_ts: Option<NaiveDateTime>,
    /// Latest parsed in-window timestamp.
    pub last_ts: Option<NaiveDateTime>,
    /// Number of rows kept in the slice.
    pub rows_in_slice: usize,
}

/// Stream-read a telemetry CSV and keep only rows inside the window.
///
/// The resolved header names the columns; placeholder columns are dropped
/// from the output frame. With no window the whole file is read (still
/// chunked, for memory bounds) and no timestamp bounds are reported.
pub fn load_window(
    path: &Path,
    header: &[String],
    encoding: SourceEncoding,
    window: Option<Window>,
    options: &LoadOptions,
    cancel: &CancelToken,
) -> Result<WindowSlice, PipelineError> {
    let kept: Vec<(usize, &String)> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_placeholder(name))
        .collect();
    let kept_names: Vec<String> = kept.iter().map(|(_, name)| (*name).clone()).collect();

    let date_idx = header.iter().position(|n| n == DATE_COLUMN);
    let time_idx = header.iter().position(|n| n == TIME_COLUMN);

    let reader = open_decoded(path, encoding)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();

    // The header row is consumed exactly once, before chunking begins.
    match records.next() {
        Some(first) => {
            first?;
        }
        None => return Err(PipelineError::HeaderEmpty),
    }

    let mut frame = SensorFrame::new(kept_names);
    let mut first_ts: Option<NaiveDateTime> = None;
    let mut last_ts: Option<NaiveDateTime> = None;
    let mut rows_in_slice = 0usize;
    let chunk_rows = options.chunk_rows.max(1);
    let mut chunk: Vec<csv::StringRecord> = Vec::with_capacity(chunk_rows);
    let mut chunk_index = 0usize;
    let mut done = false;

    loop {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        chunk.clear();
        for record in records.by_ref() {
            chunk.push(record?);
            if chunk.len() >= chunk_rows {
                break;
            }
        }
        if chunk.is_empty() {
            break;
        }
        chunk_index += 1;

        match window {
            None => {
                for record in &chunk {
                    push_record(&mut frame, record, &kept);
                }
                rows_in_slice += chunk.len();
            }
            Some(w) => {
                let (Some(date_idx), Some(time_idx)) = (date_idx, time_idx) else {
                    return Err(PipelineError::MissingTimeColumns);
                };
                let dates: Vec<&str> = chunk
                    .iter()
                    .map(|r| r.get(date_idx).unwrap_or(""))
                    .collect();
                let times: Vec<&str> = chunk
                    .iter()
                    .map(|r| r.get(time_idx).unwrap_or(""))
                    .collect();
                let timestamps = parse_timestamps(&dates, &times);

                for (record, ts) in chunk.iter().zip(timestamps.iter()) {
                    let Some(ts) = ts else { continue };
                    if !w.contains(*ts) {
                        continue;
                    }
                    push_record(&mut frame, record, &kept);
                    rows_in_slice += 1;
                    if first_ts.map_or(true, |f| *ts < f) {
                        first_ts = Some(*ts);
                    }
                    if last_ts.map_or(true, |l| *ts > l) {
                        last_ts = Some(*ts);
                    }
                }

                // The log is time-ordered: once a parsed timestamp passes
                // the window end, later chunks cannot match.
                if timestamps.iter().flatten().any(|ts| *ts > w.end) {
                    done = true;
                }
            }
        }

        debug!(
            "chunk {}: {} rows scanned, {} kept so far",
            chunk_index,
            chunk.len(),
            rows_in_slice
        );

        if done {
            break;
        }
    }

    if window.is_some() && rows_in_slice == 0 {
        return Err(PipelineError::EmptyWindow);
    }

    Ok(WindowSlice {
        frame,
        first_ts,
        last_ts,
        rows_in_slice,
    })
}

fn push_record(frame: &mut SensorFrame, record: &csv::StringRecord, kept: &[(usize, &String)]) {
    let fields: Vec<&str> = kept
        .iter()
        .map(|(src, _)| record.get(*src).unwrap_or(""))
        .collect();
    frame.push_row(&fields);
}
