//! Derived representative series for redundant sensor rails.
//!
//! SPD hub temperature probes come one per memory module, so a stick of
//! four DIMMs yields four near-identical columns. Plots want a single
//! representative series; the per-instance columns are suppressed by the
//! selector once the derived column exists.

use log::debug;
use regex::Regex;
use std::sync::OnceLock;

use crate::frame::SensorFrame;

/// Display name of the derived representative column. Never a raw header
/// name in any HWiNFO export.
pub const RAIL_DERIVED_NAME: &str = "SPD Hub Max [°C]";

fn rail_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^SPD Hub Temperature \[°C\]( #\d+)?$").expect("valid rail pattern")
    })
}

/// True for a per-instance rail column (any occurrence suffix).
pub fn is_rail_instance(name: &str) -> bool {
    rail_pattern().is_match(name)
}

/// How the representative series is computed from the per-instance columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RailPolicy {
    /// The whole time series of the single instance with the highest mean.
    /// Preserves one physical sensor's behavior over time.
    #[default]
    HighestMeanSeries,
    /// Per-row maximum across all instances: a worst-case envelope that may
    /// jump between physical sensors from sample to sample.
    RowwiseMax,
}

/// Append the derived representative column for the rail, if the rail
/// exists in the frame. Absence of matching columns is a no-op, not an
/// error: the rail may simply not exist on this hardware.
///
/// Returns whether the derived column was added.
pub fn add_rail_representative(frame: &mut SensorFrame, policy: RailPolicy) -> bool {
    let instances: Vec<String> = frame
        .column_names()
        .iter()
        .filter(|name| is_rail_instance(name))
        .cloned()
        .collect();
    if instances.is_empty() {
        return false;
    }

    let series: Vec<Vec<Option<f64>>> = instances
        .iter()
        .filter_map(|name| frame.numeric(name))
        .collect();

    let derived = match policy {
        RailPolicy::HighestMeanSeries => {
            let best = series
                .iter()
                .filter_map(|values| column_mean(values).map(|mean| (values, mean)))
                .max_by(|(_, a), (_, b)| a.total_cmp(b));
            match best {
                Some((values, mean)) => {
                    debug!(
                        "rail representative: highest-mean instance of {} (mean {:.2})",
                        instances.len(),
                        mean
                    );
                    values.clone()
                }
                // All instances non-numeric over the window.
                None => return false,
            }
        }
        RailPolicy::RowwiseMax => (0..frame.row_count())
            .map(|row| {
                series
                    .iter()
                    .filter_map(|values| values[row])
                    .max_by(f64::total_cmp)
            })
            .collect(),
    };

    frame.add_float_column(RAIL_DERIVED_NAME, derived);
    true
}

fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values.iter().flatten() {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
