use anyhow::{Context, Result};
use std::path::PathBuf;

use hwlog::encoding::sniff_encoding;
use hwlog::header::{is_placeholder, read_resolved_header};

/// List the resolved column names of a telemetry CSV.
pub fn run(csv: PathBuf) -> Result<()> {
    if !csv.exists() {
        anyhow::bail!("CSV not found: {}", csv.display());
    }

    let encoding = sniff_encoding(&csv);
    let header = read_resolved_header(&csv, encoding)
        .with_context(|| format!("Failed to read CSV header: {}", csv.display()))?;

    println!("Telemetry CSV Columns");
    println!("=====================");
    println!("File: {}", csv.display());
    println!("Encoding: {}", encoding.name());
    println!();

    let mut placeholders = 0usize;
    for (i, name) in header.iter().enumerate() {
        if is_placeholder(name) {
            placeholders += 1;
            continue;
        }
        println!("  {:3}. {}", i + 1, name);
    }

    println!();
    println!(
        "{} columns ({} empty placeholders hidden)",
        header.len(),
        placeholders
    );

    Ok(())
}
