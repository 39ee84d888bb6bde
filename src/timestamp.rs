//! Timestamp parsing for HWiNFO date/time columns and window bounds.
//!
//! The logger writes `Date` as `dd.mm.yyyy` and `Time` as `hh:mm:ss.mmm`,
//! but seconds occasionally lose their leading zero (`13:23:1.975`) and the
//! fractional part varies in width. Repair happens before parsing; rows
//! that still fail to parse yield `None` rather than aborting the batch.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

fn time_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{1,2}):(\d{1,2})(\.\d+)?$").expect("valid time pattern")
    })
}

/// Fix HWiNFO time strings like `13:23:1.975` -> `13:23:01.975`.
///
/// Strings that do not match `H:M:S[.frac]` are returned unchanged.
pub fn normalize_time(t: &str) -> String {
    let Some(caps) = time_pattern().captures(t) else {
        return t.to_string();
    };
    let hh: u32 = caps[1].parse().unwrap_or(0);
    let mm: u32 = caps[2].parse().unwrap_or(0);
    let ss: u32 = caps[3].parse().unwrap_or(0);
    let frac = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    format!("{hh:02}:{mm:02}:{ss:02}{frac}")
}

const FORMAT_FRACTIONAL: &str = "%d.%m.%Y %H:%M:%S%.f";
const FORMAT_WHOLE_SECONDS: &str = "%d.%m.%Y %H:%M:%S";

/// Lenient day-first fallback formats, tried per row in order.
const LENIENT_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse paired date/time columns into one timestamp series.
///
/// The fractional-seconds format is tried on the whole series first; if any
/// value parses, that interpretation wins for every row. Then the
/// whole-seconds format, then a lenient day-first fallback. Individual
/// unparseable rows yield `None`.
pub fn parse_timestamps<S1: AsRef<str>, S2: AsRef<str>>(
    dates: &[S1],
    times: &[S2],
) -> Vec<Option<NaiveDateTime>> {
    let combined: Vec<String> = dates
        .iter()
        .zip(times.iter())
        .map(|(d, t)| format!("{} {}", d.as_ref(), normalize_time(t.as_ref())))
        .collect();

    for format in [FORMAT_FRACTIONAL, FORMAT_WHOLE_SECONDS] {
        let parsed: Vec<Option<NaiveDateTime>> = combined
            .iter()
            .map(|s| NaiveDateTime::parse_from_str(s, format).ok())
            .collect();
        if parsed.iter().any(Option::is_some) {
            return parsed;
        }
    }

    combined.iter().map(|s| parse_lenient(s)).collect()
}

fn parse_lenient(s: &str) -> Option<NaiveDateTime> {
    LENIENT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Parse a window bound in the `YYYY-MM-DD HH:MM:SS[.mmm]` shape written by
/// the run orchestrator, tolerating a missing fractional part and a `T`
/// separator.
pub fn parse_bound(s: &str) -> Option<NaiveDateTime> {
    const BOUND_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    let s = s.trim();
    BOUND_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    #[test]
    fn test_normalize_time_pads_components() {
        assert_eq!(normalize_time("13:23:1.975"), "13:23:01.975");
        assert_eq!(normalize_time("9:5:3"), "09:05:03");
        assert_eq!(normalize_time("10:00:00.123"), "10:00:00.123");
    }

    #[test]
    fn test_normalize_time_passes_malformed_unchanged() {
        assert_eq!(normalize_time("not a time"), "not a time");
        assert_eq!(normalize_time("10:00"), "10:00");
        assert_eq!(normalize_time(""), "");
    }

    #[test]
    fn test_parse_fractional_series() {
        let dates = ["01.02.2024", "01.02.2024"];
        let times = ["10:00:00.500", "10:00:1.975"];
        let parsed = parse_timestamps(&dates, &times);
        assert_eq!(parsed[0], Some(ts(2024, 2, 1, 10, 0, 0, 500)));
        assert_eq!(parsed[1], Some(ts(2024, 2, 1, 10, 0, 1, 975)));
    }

    #[test]
    fn test_whole_second_fallback() {
        // chrono's %.f accepts a missing fraction, so whole-second rows
        // already parse on the first pass; a malformed row stays None.
        let dates = ["01.02.2024", "garbage"];
        let times = ["10:00:05", "xx"];
        let parsed = parse_timestamps(&dates, &times);
        assert_eq!(parsed[0], Some(ts(2024, 2, 1, 10, 0, 5, 0)));
        assert_eq!(parsed[1], None);
    }

    #[test]
    fn test_lenient_fallback_iso_dates() {
        let dates = ["2024-02-01"];
        let times = ["10:00:00"];
        let parsed = parse_timestamps(&dates, &times);
        assert_eq!(parsed[0], Some(ts(2024, 2, 1, 10, 0, 0, 0)));
    }

    #[test]
    fn test_all_rows_unparseable_yields_all_none() {
        let dates = ["a", "b"];
        let times = ["c", "d"];
        let parsed = parse_timestamps(&dates, &times);
        assert!(parsed.iter().all(Option::is_none));
    }

    #[test]
    fn test_parse_bound_variants() {
        assert_eq!(
            parse_bound("2024-02-01 10:00:00.500"),
            Some(ts(2024, 2, 1, 10, 0, 0, 500))
        );
        assert_eq!(
            parse_bound("2024-02-01 10:00:00"),
            Some(ts(2024, 2, 1, 10, 0, 0, 0))
        );
        assert_eq!(parse_bound("yesterday"), None);
    }
}
