//! Column-major time-series frame for windowed telemetry.
//!
//! Rows are kept in the file's physical order. The two reserved `Date` and
//! `Time` text columns derive a timestamp axis; everything else is an open
//! set of measurement columns named per the resolved header. Mutation is
//! append-only: row appends during windowing and column additions for
//! derived/merged series.

use chrono::NaiveDateTime;

use crate::timestamp::parse_timestamps;

/// Reserved name of the date column.
pub const DATE_COLUMN: &str = "Date";
/// Reserved name of the time column.
pub const TIME_COLUMN: &str = "Time";

/// Storage for a single column.
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// Raw text cells as read from the CSV.
    Text(Vec<String>),
    /// Synthesized numeric series (derived rail, merged ambient).
    Float(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table of named columns with equal row counts.
#[derive(Debug, Clone, Default)]
pub struct SensorFrame {
    names: Vec<String>,
    columns: Vec<ColumnData>,
}

impl SensorFrame {
    /// Create an empty frame with the given column names.
    pub fn new(names: Vec<String>) -> Self {
        let columns = names.iter().map(|_| ColumnData::Text(Vec::new())).collect();
        Self { names, columns }
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, ColumnData::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Append one row of text cells. Missing trailing fields are padded
    /// with empty strings; extra fields are dropped.
    pub fn push_row<S: AsRef<str>>(&mut self, fields: &[S]) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            let value = fields.get(i).map(|f| f.as_ref()).unwrap_or("");
            match column {
                ColumnData::Text(cells) => cells.push(value.to_string()),
                ColumnData::Float(cells) => cells.push(value.parse().ok()),
            }
        }
    }

    /// Append a synthesized full-length numeric column. A series whose
    /// length disagrees with the frame's row count is a caller bug.
    pub fn add_float_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.row_count());
        if let Some(i) = self.column_index(name) {
            self.columns[i] = ColumnData::Float(values);
        } else {
            self.names.push(name.to_string());
            self.columns.push(ColumnData::Float(values));
        }
    }

    /// Numeric view of a column: text cells parsed best-effort, blanks and
    /// non-numeric cells as `None`.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        match self.column(name)? {
            ColumnData::Float(values) => Some(values.clone()),
            ColumnData::Text(cells) => Some(
                cells
                    .iter()
                    .map(|c| c.trim().parse::<f64>().ok())
                    .collect(),
            ),
        }
    }

    /// Text view of a column; `None` for synthesized numeric columns.
    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.column(name)? {
            ColumnData::Text(cells) => Some(cells),
            ColumnData::Float(_) => None,
        }
    }

    pub fn has_time_columns(&self) -> bool {
        self.has_column(DATE_COLUMN) && self.has_column(TIME_COLUMN)
    }

    /// Parse the `Date`/`Time` columns into a timestamp series; `None` when
    /// the reserved columns are absent.
    pub fn timestamps(&self) -> Option<Vec<Option<NaiveDateTime>>> {
        let dates = self.text(DATE_COLUMN)?;
        let times = self.text(TIME_COLUMN)?;
        Some(parse_timestamps(dates, times))
    }

    /// Elapsed seconds from the first parseable timestamp; positional
    /// `0..n` axis when no timestamp parses at all.
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        if let Some(timestamps) = self.timestamps() {
            if let Some(t0) = timestamps.iter().flatten().next().copied() {
                return timestamps
                    .iter()
                    .enumerate()
                    .map(|(i, ts)| match ts {
                        Some(t) => (*t - t0).num_milliseconds() as f64 / 1000.0,
                        None => i as f64,
                    })
                    .collect();
            }
        }
        (0..self.row_count()).map(|i| i as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> SensorFrame {
        let mut frame = SensorFrame::new(vec![
            "Date".into(),
            "Time".into(),
            "CPU Package [°C]".into(),
        ]);
        frame.push_row(&["01.02.2024", "10:00:00.000", "45.5"]);
        frame.push_row(&["01.02.2024", "10:00:01.000", "46.0"]);
        frame.push_row(&["01.02.2024", "10:00:02.000", "n/a"]);
        frame
    }

    #[test]
    fn test_numeric_view_tolerates_bad_cells() {
        let frame = sample_frame();
        let values = frame.numeric("CPU Package [°C]").unwrap();
        assert_eq!(values, vec![Some(45.5), Some(46.0), None]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut frame = sample_frame();
        frame.push_row(&["01.02.2024", "10:00:03.000"]);
        assert_eq!(frame.row_count(), 4);
        let values = frame.numeric("CPU Package [°C]").unwrap();
        assert_eq!(values[3], None);
    }

    #[test]
    fn test_elapsed_seconds_from_first_timestamp() {
        let frame = sample_frame();
        let elapsed = frame.elapsed_seconds();
        assert_eq!(elapsed, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_elapsed_seconds_positional_fallback() {
        let mut frame = SensorFrame::new(vec!["Value".into()]);
        frame.push_row(&["1"]);
        frame.push_row(&["2"]);
        assert_eq!(frame.elapsed_seconds(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_add_float_column_replaces_existing() {
        let mut frame = sample_frame();
        frame.add_float_column("Derived", vec![Some(1.0), Some(2.0), Some(3.0)]);
        frame.add_float_column("Derived", vec![Some(9.0), Some(8.0), Some(7.0)]);
        assert_eq!(frame.column_names().len(), 4);
        assert_eq!(
            frame.numeric("Derived").unwrap(),
            vec![Some(9.0), Some(8.0), Some(7.0)]
        );
    }
}
