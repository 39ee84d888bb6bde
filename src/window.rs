//! Inclusive time windows used to slice telemetry logs.

use chrono::NaiveDateTime;

use crate::error::PipelineError;
use crate::timestamp::parse_bound;

/// An inclusive closed timestamp interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidWindow(
                "window end is earlier than window start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Build a window from optional textual bounds.
    ///
    /// Both-or-neither is a strict precondition: a partial pair or an
    /// unparseable bound is an `InvalidWindow` error, never best-effort.
    pub fn from_bounds(
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Option<Self>, PipelineError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => Err(PipelineError::InvalidWindow(
                "provide both window start and window end, or neither".to_string(),
            )),
            (Some(s), Some(e)) => {
                let start = parse_bound(s).ok_or_else(|| {
                    PipelineError::InvalidWindow(format!(
                        "could not parse window start {s:?}; use YYYY-MM-DD HH:MM:SS[.mmm]"
                    ))
                })?;
                let end = parse_bound(e).ok_or_else(|| {
                    PipelineError::InvalidWindow(format!(
                        "could not parse window end {e:?}; use YYYY-MM-DD HH:MM:SS[.mmm]"
                    ))
                })?;
                Self::new(start, end).map(Some)
            }
        }
    }

    #[inline]
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}
