//! # hwlog - HWiNFO telemetry windowing & comparison toolkit
//!
//! `hwlog` slices bounded time windows out of continuously-growing HWiNFO
//! CSV telemetry logs, reconciles their messy headers, synthesizes
//! representative series for redundant sensor rails, merges an
//! independently-sampled ambient-temperature log by nearest timestamp, and
//! aligns multiple benchmark runs for side-by-side comparison.
//!
//! ## Key properties
//!
//! - **Bounded memory**: the telemetry log is read in fixed-size row
//!   chunks with early termination once the window end has passed, so a
//!   multi-gigabyte growing log never has to fit in RAM.
//!
//! - **Encoding robustness**: UTF-16 (BOM-prefixed), UTF-8 (with or
//!   without signature) and Windows-1252 exports are detected and decoded,
//!   and the degree-sign mojibake HWiNFO is known for is normalized away.
//!
//! - **Stable column naming**: duplicate sensor names are disambiguated
//!   deterministically (`name`, `name #1`, `name #2`, ...) so saved
//!   selections keep meaning the same physical sensor across reads.
//!
//! - **Read-only source handling**: the hardware monitor is the sole
//!   writer of the telemetry log; reads tolerate the file growing between
//!   chunks and cancellation is cooperative at chunk boundaries.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hwlog::encoding::sniff_encoding;
//! use hwlog::header::read_resolved_header;
//! use hwlog::loader::{load_window, CancelToken, LoadOptions};
//! use hwlog::select::select_series;
//! use hwlog::window::Window;
//! use std::path::Path;
//!
//! let path = Path::new("sensors.csv");
//! let encoding = sniff_encoding(path);
//! let header = read_resolved_header(path, encoding)?;
//! let window = Window::from_bounds(
//!     Some("2024-02-01 10:00:00"),
//!     Some("2024-02-01 10:30:00"),
//! )?;
//! let slice = load_window(
//!     path,
//!     &header,
//!     encoding,
//!     window,
//!     &LoadOptions::default(),
//!     &CancelToken::new(),
//! )?;
//! let selected = select_series(&slice.frame, &["CPU Package [°C]".to_string()])?;
//! println!("{} rows, {} series", slice.rows_in_slice, selected.len());
//! # Ok::<(), hwlog::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized leaf-first:
//!
//! - [`encoding`]: encoding detection and header text cleanup
//! - [`header`]: duplicate-name disambiguation into the canonical column space
//! - [`timestamp`]: time-string repair and layered timestamp parsing
//! - [`window`]: inclusive time windows with both-or-neither validation
//! - [`loader`]: chunked streaming window extraction with early stop
//! - [`rail`]: derived representative series for redundant sensor rails
//! - [`select`]: exact-first/regex-fallback column selection
//! - [`ambient`]: nearest-timestamp ambient merge with tolerance
//! - [`compare`]: multi-run duration trimming and common-axis resampling
//! - [`export`]: slice/audit/summary output artifacts
//! - [`config`]: TOML configuration

pub mod ambient;
pub mod compare;
pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod frame;
pub mod header;
pub mod loader;
pub mod rail;
pub mod select;
pub mod timestamp;
pub mod window;

pub use error::PipelineError;
