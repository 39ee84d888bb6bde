use anyhow::{Context, Result};
use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

use hwlog::compare::{
    dedup_labels, resample_runs, trim_to_shortest_duration, CompareManifest, RunFrame,
};

/// Align the runs named by a compare manifest and export one comparison
/// CSV per sensor (shared elapsed axis, one column per run).
pub fn run(manifest_path: PathBuf, out: PathBuf) -> Result<()> {
    let manifest = CompareManifest::from_file(&manifest_path)
        .with_context(|| format!("Failed to load manifest: {}", manifest_path.display()))?;
    if manifest.sensors.is_empty() {
        anyhow::bail!("Compare manifest names no sensors");
    }
    if manifest.runs.len() < 2 {
        anyhow::bail!("Compare manifest names fewer than two runs");
    }

    // The manifest lives at runs/<case>/<run>/compare_manifest.json, so
    // the runs root is two parents up; degrade to the manifest's own
    // directory for free-standing manifests.
    let runs_root = manifest_path
        .ancestors()
        .nth(3)
        .unwrap_or_else(|| manifest_path.parent().unwrap_or(Path::new(".")))
        .to_path_buf();

    let labels: Vec<String> = manifest
        .runs
        .iter()
        .map(|rel| display_label(&runs_root.join(rel)))
        .collect();
    let labels = dedup_labels(&labels);

    let mut runs: Vec<RunFrame> = Vec::with_capacity(manifest.runs.len());
    for (rel, label) in manifest.runs.iter().zip(labels.iter()) {
        let csv_path = runs_root.join(rel).join("run_window.csv");
        if !csv_path.is_file() {
            warn!("Run has no exported window CSV: {}", csv_path.display());
            runs.push(RunFrame {
                label: label.clone(),
                ..RunFrame::default()
            });
            continue;
        }
        match RunFrame::load(&csv_path, label, &manifest.sensors) {
            Ok(run) => runs.push(run),
            Err(e) => {
                warn!("Skipping unreadable run {}: {e}", csv_path.display());
                runs.push(RunFrame {
                    label: label.clone(),
                    ..RunFrame::default()
                });
            }
        }
    }

    let runs = trim_to_shortest_duration(runs);
    let aligned = resample_runs(&runs, &manifest.sensors)
        .ok_or_else(|| anyhow::anyhow!("Not enough overlapping data to compare the runs"))?;

    std::fs::create_dir_all(&out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

    for (sensor_idx, sensor) in aligned.sensors.iter().enumerate() {
        let path = out.join(format!("compare_{}.csv", sanitize(sensor)));
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["elapsed_s".to_string()];
        header.extend(aligned.labels.iter().cloned());
        writer.write_record(&header)?;

        for (point, elapsed) in aligned.elapsed.iter().enumerate() {
            let mut record = vec![format!("{elapsed:.3}")];
            for run_series in &aligned.values[sensor_idx] {
                record.push(
                    run_series[point]
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}

/// Display label for a run folder: `<case> <stress-mode>`, inferred from
/// the run folder name, falling back to the folder name itself.
fn display_label(run_dir: &Path) -> String {
    let name = run_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let case = run_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let stress = Regex::new(r"^(?i)(CPUGPU|CPU|GPU)_W\d+_L\d+_V\d+$")
        .ok()
        .and_then(|rx| rx.captures(&name))
        .map(|caps| caps[1].to_uppercase());

    match (case.is_empty(), stress) {
        (false, Some(stress)) => format!("{case} {stress}"),
        (false, None) => format!("{case} {name}"),
        (true, Some(stress)) => stress,
        (true, None) => name,
    }
}

/// Make a sensor name safe as a file-name fragment.
fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .take(180)
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '.' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_stress_folders() {
        assert_eq!(
            display_label(Path::new("runs/case1/CPU_W5_L30_V2")),
            "case1 CPU"
        );
        assert_eq!(
            display_label(Path::new("runs/case2/cpugpu_W1_L1_V1")),
            "case2 CPUGPU"
        );
        assert_eq!(
            display_label(Path::new("runs/case3/oddly_named")),
            "case3 oddly_named"
        );
    }

    #[test]
    fn test_sanitize_sensor_names() {
        assert_eq!(sanitize("CPU Package [°C]"), "CPU_Package___C_");
        assert_eq!(sanitize("GPU-Power.W"), "GPU-Power.W");
    }
}
