use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hwlog::rail::RailPolicy;

mod columns;
mod compare;
mod slice;

/// hwlog - HWiNFO telemetry windowing & comparison toolkit
#[derive(Parser)]
#[command(name = "hwlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Optional hwlog.toml config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// How the representative series for a redundant rail is computed.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum RailPolicyArg {
    /// Whole series of the single instance with the highest mean
    #[default]
    HighestMean,
    /// Per-row maximum across all instances
    RowwiseMax,
}

impl From<RailPolicyArg> for RailPolicy {
    fn from(arg: RailPolicyArg) -> Self {
        match arg {
            RailPolicyArg::HighestMean => RailPolicy::HighestMeanSeries,
            RailPolicyArg::RowwiseMax => RailPolicy::RowwiseMax,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Slice a time window out of a telemetry CSV, select sensors, merge
    /// ambient readings and export the results
    Slice {
        /// Source telemetry CSV path
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,

        /// Output directory for exported artifacts
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Sensor patterns: exact column names or regexes
        #[arg(long, num_args = 0.., value_name = "PATTERN")]
        patterns: Vec<String>,

        /// Window start (YYYY-MM-DD HH:MM:SS[.mmm]); requires --window-end
        #[arg(long, value_name = "TS")]
        window_start: Option<String>,

        /// Window end (YYYY-MM-DD HH:MM:SS[.mmm]); requires --window-start
        #[arg(long, value_name = "TS")]
        window_end: Option<String>,

        /// Export run_window.csv (plus ambient_window.csv and
        /// window_check.txt when applicable)
        #[arg(long)]
        export_window_csv: bool,

        /// Optional ambient log CSV (timestamp, ambient_c)
        #[arg(long, value_name = "FILE")]
        ambient_csv: Option<PathBuf>,

        /// Column name for the merged ambient series; overrides the config
        /// file [default: Ambient [°C]]
        #[arg(long, value_name = "NAME")]
        ambient_col_name: Option<String>,

        /// Representative-series policy for redundant rails
        #[arg(long, value_enum, default_value_t = RailPolicyArg::HighestMean)]
        rail_policy: RailPolicyArg,
    },

    /// List the resolved column names of a telemetry CSV
    Columns {
        /// Source telemetry CSV path
        #[arg(value_name = "FILE")]
        csv: PathBuf,
    },

    /// Align the runs named by a compare manifest onto a shared
    /// elapsed-time axis and export per-sensor comparison CSVs
    Compare {
        /// compare_manifest.json path
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,

        /// Output directory for comparison CSVs
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },
}

pub use columns::run as run_columns;
pub use compare::run as run_compare;
pub use slice::{run as run_slice, SliceArgs};
