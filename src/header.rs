//! Header resolution for telemetry CSVs.
//!
//! HWiNFO headers can contain duplicate sensor names (one per identical
//! probe) and empty placeholder fields. The resolved header is the
//! canonical column-name space for a file: every subsystem that reads the
//! same file must produce the identical name list, or saved selections and
//! cached group mappings silently desynchronize.

use std::io::Read;
use std::path::Path;

use crate::encoding::{clean_text, open_decoded, SourceEncoding};
use crate::error::PipelineError;

/// Prefix used for empty header fields. Placeholder columns are excluded
/// from selection, plotting and export.
const PLACEHOLDER_PREFIX: &str = "__EMPTY_";

/// True for the positional placeholder names substituted for empty fields.
pub fn is_placeholder(name: &str) -> bool {
    name.starts_with(PLACEHOLDER_PREFIX)
}

/// Read the raw header row of a telemetry CSV and resolve it into the
/// canonical unique name list.
pub fn read_resolved_header(
    path: &Path,
    encoding: SourceEncoding,
) -> Result<Vec<String>, PipelineError> {
    let reader = open_decoded(path, encoding)?;
    read_resolved_header_from(reader)
}

fn read_resolved_header_from<R: Read>(reader: R) -> Result<Vec<String>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = csv::StringRecord::new();
    if !csv_reader.read_record(&mut record)? {
        return Err(PipelineError::HeaderEmpty);
    }
    let raw: Vec<String> = record.iter().map(|f| f.to_string()).collect();
    resolve_header(&raw)
}

/// Clean raw header fields, substitute positional placeholders for empty
/// ones, and disambiguate duplicates by appending ` #n` to the second and
/// later occurrences.
///
/// Idempotent: resolving an already-resolved header is the identity.
pub fn resolve_header<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, PipelineError> {
    if raw.is_empty() {
        return Err(PipelineError::HeaderEmpty);
    }

    let cleaned: Vec<String> = raw
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = clean_text(field.as_ref());
            if name.is_empty() {
                format!("{PLACEHOLDER_PREFIX}{i}__")
            } else {
                name
            }
        })
        .collect();

    Ok(make_unique(&cleaned))
}

/// Append ` #n` occurrence suffixes to duplicate names. The first
/// occurrence keeps the bare name; counters start at 1 per base name and
/// skip any suffix that already appears literally in the input, so the
/// output is pairwise distinct even when a field like `name #1` coexists
/// with duplicated `name` fields.
fn make_unique(names: &[String]) -> Vec<String> {
    let literals: std::collections::HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut counts: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match counts.get_mut(name.as_str()) {
            None => {
                counts.insert(name.as_str(), 0);
                out.push(name.clone());
            }
            Some(count) => loop {
                *count += 1;
                let candidate = format!("{name} #{count}");
                if !literals.contains(candidate.as_str()) {
                    out.push(candidate);
                    break;
                }
            },
        }
    }
    out
}
