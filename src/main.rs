//! # hwlog
//!
//! Command-line tool for slicing, selecting and comparing HWiNFO CSV
//! telemetry.
//!
//! ## Usage
//!
//! ```bash
//! # Slice a run window and export run_window.csv + summary.csv
//! hwlog slice --csv sensors.csv --out run1 \
//!     --patterns "CPU Package [°C]" "GPU" \
//!     --window-start "2024-02-01 10:00:00" \
//!     --window-end "2024-02-01 10:30:00" \
//!     --export-window-csv
//!
//! # Inspect the resolved column names
//! hwlog columns sensors.csv
//!
//! # Align saved runs for comparison
//! hwlog compare --manifest runs/case/cmp/compare_manifest.json --out cmp
//! ```

use anyhow::Result;
use clap::Parser;

use hwlog::config::Config;

mod cli;

use cli::{Cli, Commands, SliceArgs};

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match args.command {
        Commands::Slice {
            csv,
            out,
            patterns,
            window_start,
            window_end,
            export_window_csv,
            ambient_csv,
            ambient_col_name,
            rail_policy,
        } => cli::run_slice(
            SliceArgs {
                csv,
                out,
                patterns,
                window_start,
                window_end,
                export_window_csv,
                ambient_csv,
                ambient_col_name,
                rail_policy: rail_policy.into(),
            },
            &config,
        ),
        Commands::Columns { csv } => cli::run_columns(csv),
        Commands::Compare { manifest, out } => cli::run_compare(manifest, out),
    }
}
