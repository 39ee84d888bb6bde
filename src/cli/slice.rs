use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use hwlog::ambient::{merge_ambient, AmbientSeries, DEFAULT_TOLERANCE_SECONDS};
use hwlog::config::Config;
use hwlog::encoding::sniff_encoding;
use hwlog::export::{write_ambient_window, write_run_window, write_summary, write_window_check};
use hwlog::header::read_resolved_header;
use hwlog::loader::{load_window, CancelToken, LoadOptions};
use hwlog::rail::{add_rail_representative, RailPolicy};
use hwlog::select::select_series;
use hwlog::window::Window;
use hwlog::PipelineError;

const DEFAULT_AMBIENT_COLUMN: &str = "Ambient [°C]";

/// Arguments for the slice subcommand.
pub struct SliceArgs {
    pub csv: PathBuf,
    pub out: PathBuf,
    pub patterns: Vec<String>,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub export_window_csv: bool,
    pub ambient_csv: Option<PathBuf>,
    pub ambient_col_name: Option<String>,
    pub rail_policy: RailPolicy,
}

/// Precedence for the merged-ambient column name: CLI flag, then config
/// file, then the built-in default.
fn ambient_column_name(flag: Option<&str>, config: &Config) -> String {
    flag.map(str::to_string)
        .or_else(|| config.ambient.column_name.clone())
        .unwrap_or_else(|| DEFAULT_AMBIENT_COLUMN.to_string())
}

/// Slice a window out of a telemetry CSV, select sensors, merge ambient
/// readings and export the artifacts.
pub fn run(args: SliceArgs, config: &Config) -> Result<()> {
    if !args.csv.exists() {
        anyhow::bail!("CSV not found: {}", args.csv.display());
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output directory: {}", args.out.display()))?;

    let encoding = sniff_encoding(&args.csv);
    info!("Source encoding: {}", encoding.name());

    let header = read_resolved_header(&args.csv, encoding)
        .with_context(|| format!("Failed to read CSV header: {}", args.csv.display()))?;
    info!("Resolved {} columns", header.len());

    let window = Window::from_bounds(args.window_start.as_deref(), args.window_end.as_deref())?;

    let options = LoadOptions {
        chunk_rows: config
            .load
            .chunk_rows
            .unwrap_or(LoadOptions::default().chunk_rows),
    };
    let mut slice = load_window(
        &args.csv,
        &header,
        encoding,
        window,
        &options,
        &CancelToken::new(),
    )
    .with_context(|| format!("Failed to load window from {}", args.csv.display()))?;
    info!("Kept {} rows in slice", slice.rows_in_slice);

    if add_rail_representative(&mut slice.frame, args.rail_policy) {
        info!("Added derived rail representative column");
    }

    // Best-effort ambient merge: any failure degrades to "no ambient
    // column", never aborts the primary pipeline.
    let ambient_col = ambient_column_name(args.ambient_col_name.as_deref(), config);
    let tolerance = config
        .ambient
        .tolerance_seconds
        .unwrap_or(DEFAULT_TOLERANCE_SECONDS);
    let mut ambient_window = AmbientSeries::default();
    if let Some(ambient_path) = &args.ambient_csv {
        if ambient_path.is_file() {
            match AmbientSeries::load(ambient_path, config.ambient.calibration_offset_c) {
                Ok(ambient) => {
                    ambient_window = merge_ambient(
                        &mut slice.frame,
                        &ambient,
                        window,
                        &ambient_col,
                        tolerance,
                    );
                }
                Err(e) => warn!("Skipping ambient merge: {e}"),
            }
        } else {
            warn!("Ambient CSV not found: {}", ambient_path.display());
        }
    }

    // Surface the merged ambient series in exports and the summary. An
    // ambient-only run is legitimate: an empty core selection is fatal only
    // when no merged ambient column exists either.
    let mut selected = match select_series(&slice.frame, &args.patterns) {
        Ok(selected) => selected,
        Err(PipelineError::NoColumnsSelected) if slice.frame.has_column(&ambient_col) => {
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    if slice.frame.has_column(&ambient_col) && !selected.contains(&ambient_col) {
        selected.push(ambient_col.clone());
    }

    if args.export_window_csv {
        write_run_window(&args.out, &slice.frame, &selected)?;
        write_ambient_window(&args.out, &ambient_window)?;
        if let (Some(start), Some(end)) = (&args.window_start, &args.window_end) {
            write_window_check(&args.out, start, end, &slice)?;
        }
    }

    write_summary(&args.out, &slice.frame, &selected)?;
    info!(
        "Wrote summary for {} series to {}",
        selected.len(),
        args.out.display()
    );

    Ok(())
}
