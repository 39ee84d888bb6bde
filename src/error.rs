//! Error taxonomy for the telemetry windowing pipeline.
//!
//! Fatal kinds propagate to the CLI boundary as a single descriptive
//! failure; everything else (row-level timestamp failures, ambient join
//! misses, ambient subsystem failures) is absorbed locally and reflected
//! only in output completeness.

/// Errors that can occur while loading, windowing and selecting telemetry.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader/writer
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header row missing or empty
    #[error("CSV header is empty")]
    HeaderEmpty,

    /// Window bounds are partial, unparseable, or reversed
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// The file has no Date/Time columns, so it cannot be time-filtered
    #[error("CSV missing Date/Time columns; cannot window-filter")]
    MissingTimeColumns,

    /// No rows fell inside the requested window (legitimate "no data")
    #[error("no rows found within the requested time window")]
    EmptyWindow,

    /// The final column selection came out empty
    #[error("no columns selected; check the requested patterns against the CSV headers")]
    NoColumnsSelected,

    /// Literal-looking patterns that matched no column exactly
    #[error("exact columns not found in CSV:\n- {}", .0.join("\n- "))]
    ExactColumnsNotFound(Vec<String>),

    /// The caller requested cancellation at a chunk boundary
    #[error("load cancelled")]
    Cancelled,
}
