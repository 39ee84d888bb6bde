//! Column selection: resolving user sensor requests against CSV columns.
//!
//! Exact case-insensitive match wins and never falls through to regex.
//! A pattern that looks like a literal column reference (bracketed unit or
//! occurrence suffix) but matches nothing is a hard error listing every
//! such miss, instead of fuzzy-matching the wrong duplicate. Precision over
//! recall: several near-identical sensor names usually coexist.

use log::warn;
use regex::RegexBuilder;

use crate::encoding::clean_text;
use crate::error::PipelineError;
use crate::frame::{SensorFrame, DATE_COLUMN, TIME_COLUMN};
use crate::header::is_placeholder;
use crate::rail::{is_rail_instance, RAIL_DERIVED_NAME};

/// Resolve requested patterns to an ordered, de-duplicated column list.
pub fn select_series(
    frame: &SensorFrame,
    patterns: &[String],
) -> Result<Vec<String>, PipelineError> {
    let candidates: Vec<&String> = frame
        .column_names()
        .iter()
        .filter(|name| {
            name.as_str() != DATE_COLUMN && name.as_str() != TIME_COLUMN && !is_placeholder(name)
        })
        .collect();

    let exact: std::collections::HashMap<String, &String> = candidates
        .iter()
        .map(|name| (name.to_lowercase(), *name))
        .collect();

    let cleaned: Vec<String> = patterns.iter().map(|p| clean_text(p)).collect();

    let mut selected: Vec<String> = Vec::new();
    let mut missing_exact: Vec<String> = Vec::new();

    for pattern in &cleaned {
        let key = pattern.to_lowercase();

        if let Some(name) = exact.get(&key) {
            selected.push((*name).clone());
            continue;
        }

        if looks_like_literal(pattern) {
            // The derived rail column is a legitimate request even though
            // it never appears as a raw CSV header.
            if key != RAIL_DERIVED_NAME.to_lowercase() {
                missing_exact.push(pattern.clone());
            }
            continue;
        }

        let Ok(rx) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            // Invalid free-text patterns are skipped silently.
            continue;
        };
        for name in &candidates {
            if rx.is_match(name) {
                selected.push((*name).clone());
            }
        }
    }

    if !missing_exact.is_empty() {
        return Err(PipelineError::ExactColumnsNotFound(missing_exact));
    }

    // De-duplicate preserving first occurrence.
    let mut seen = std::collections::HashSet::new();
    selected.retain(|name| seen.insert(name.clone()));

    apply_rail_substitution(frame, &cleaned, &mut selected);

    if selected.is_empty() {
        return Err(PipelineError::NoColumnsSelected);
    }
    Ok(selected)
}

/// A pattern with a bracketed unit or an occurrence suffix is meant as a
/// literal column name, not a search expression.
fn looks_like_literal(pattern: &str) -> bool {
    pattern.contains('[') || pattern.contains(" #")
}

/// Per-instance rail columns are never offered directly; whenever the rail
/// was requested the derived column stands in for them.
fn apply_rail_substitution(frame: &SensorFrame, patterns: &[String], selected: &mut Vec<String>) {
    let derived_lower = RAIL_DERIVED_NAME.to_lowercase();
    let derived_requested = patterns.iter().any(|p| p.to_lowercase() == derived_lower);
    let rail_requested = derived_requested
        || patterns.iter().any(|p| p.to_lowercase().contains("spd hub"))
        || selected.iter().any(|name| is_rail_instance(name));

    selected.retain(|name| !is_rail_instance(name));

    if rail_requested {
        if frame.has_column(RAIL_DERIVED_NAME) {
            if !selected.iter().any(|name| name == RAIL_DERIVED_NAME) {
                selected.push(RAIL_DERIVED_NAME.to_string());
            }
        } else {
            warn!(
                "requested {RAIL_DERIVED_NAME}, but no rail columns were found to compute it; skipping"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rail::{add_rail_representative, RailPolicy};

    fn frame_with(names: &[&str]) -> SensorFrame {
        let mut frame = SensorFrame::new(names.iter().map(|n| n.to_string()).collect());
        let row: Vec<String> = names.iter().map(|_| "1.0".to_string()).collect();
        frame.push_row(&row);
        frame
    }

    fn plain_frame() -> SensorFrame {
        frame_with(&[
            "Date",
            "Time",
            "CPU Package [°C]",
            "GPU Temperature [°C]",
            "GPU Power [W]",
        ])
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let frame = plain_frame();
        let selected = select_series(&frame, &patterns(&["cpu package [°c]"])).unwrap();
        assert_eq!(selected, vec!["CPU Package [°C]"]);
    }

    #[test]
    fn test_exact_hit_never_falls_through_to_regex() {
        // "GPU" as a regex would match three columns, but the exact hit on
        // the bare "GPU" column short-circuits.
        let frame = frame_with(&[
            "Date",
            "Time",
            "GPU",
            "GPU Temperature [°C]",
            "GPU Power [W]",
        ]);
        let selected = select_series(&frame, &patterns(&["gpu"])).unwrap();
        assert_eq!(selected, vec!["GPU"]);
    }

    #[test]
    fn test_regex_fallback_for_free_text() {
        let frame = plain_frame();
        let selected = select_series(&frame, &patterns(&["GPU"])).unwrap();
        assert_eq!(selected, vec!["GPU Temperature [°C]", "GPU Power [W]"]);
    }

    #[test]
    fn test_unmatched_literal_pattern_is_fatal() {
        let frame = plain_frame();
        let err = select_series(&frame, &patterns(&["CPU Packge [°C]"])).unwrap_err();
        match err {
            PipelineError::ExactColumnsNotFound(missing) => {
                assert_eq!(missing, vec!["CPU Packge [°C]"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_regex_skipped_silently() {
        let frame = plain_frame();
        let selected = select_series(&frame, &patterns(&["(unclosed", "GPU"])).unwrap();
        assert_eq!(selected, vec!["GPU Temperature [°C]", "GPU Power [W]"]);
    }

    #[test]
    fn test_empty_selection_is_error() {
        let frame = plain_frame();
        assert!(matches!(
            select_series(&frame, &patterns(&["nothing matches this"])),
            Err(PipelineError::NoColumnsSelected)
        ));
    }

    #[test]
    fn test_mojibake_pattern_still_matches() {
        let frame = plain_frame();
        let selected = select_series(&frame, &patterns(&["CPU Package [\u{FFFD}C]"])).unwrap();
        assert_eq!(selected, vec!["CPU Package [°C]"]);
    }

    #[test]
    fn test_rail_instances_substituted_by_derived() {
        let mut frame = frame_with(&[
            "Date",
            "Time",
            "SPD Hub Temperature [°C]",
            "SPD Hub Temperature [°C] #1",
        ]);
        add_rail_representative(&mut frame, RailPolicy::HighestMeanSeries);
        let selected = select_series(&frame, &patterns(&["SPD Hub"])).unwrap();
        assert_eq!(selected, vec![RAIL_DERIVED_NAME]);
    }

    #[test]
    fn test_derived_rail_requestable_without_raw_header() {
        let mut frame = frame_with(&[
            "Date",
            "Time",
            "CPU Package [°C]",
            "SPD Hub Temperature [°C]",
        ]);
        add_rail_representative(&mut frame, RailPolicy::HighestMeanSeries);
        let selected =
            select_series(&frame, &patterns(&["CPU Package [°C]", "SPD Hub Max [°C]"])).unwrap();
        assert_eq!(selected, vec!["CPU Package [°C]", RAIL_DERIVED_NAME]);
    }

    #[test]
    fn test_rail_requested_but_absent_warns_and_proceeds() {
        let frame = plain_frame();
        let selected =
            select_series(&frame, &patterns(&["CPU Package [°C]", "SPD Hub Max [°C]"])).unwrap();
        assert_eq!(selected, vec!["CPU Package [°C]"]);
    }

    #[test]
    fn test_duplicate_requests_deduplicated_in_order() {
        let frame = plain_frame();
        let selected = select_series(
            &frame,
            &patterns(&["GPU Temperature [°C]", "GPU", "CPU Package [°C]"]),
        )
        .unwrap();
        assert_eq!(
            selected,
            vec!["GPU Temperature [°C]", "GPU Power [W]", "CPU Package [°C]"]
        );
    }
}
