//! Dataset reading and writing.
//!
//! A dataset is a list of records; each record is a flat map of field
//! names to values. The format follows the file extension: a `.json`
//! array, `.jsonl` with one object per line, or a `.yaml`/`.yml`
//! sequence.

use std::path::Path;

use anyhow::{bail, Context, Result};
use promptloop_core::Bindings;

pub fn read_records(path: &Path) -> Result<Vec<Bindings>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let records = match extension(path).as_str() {
        "json" => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON dataset {}", path.display()))?,
        "jsonl" => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Bindings>, _>>()
            .with_context(|| format!("invalid JSONL dataset {}", path.display()))?,
        "yaml" | "yml" => serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML dataset {}", path.display()))?,
        other => {
            bail!("unsupported dataset extension `{other}` (expected json, jsonl, yaml or yml)")
        }
    };
    Ok(records)
}

pub fn write_records(path: &Path, records: &[Bindings]) -> Result<()> {
    let text = match extension(path).as_str() {
        "json" => {
            let mut text = serde_json::to_string_pretty(records)?;
            text.push('\n');
            text
        }
        "jsonl" => {
            let mut lines = Vec::with_capacity(records.len());
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            let mut text = lines.join("\n");
            text.push('\n');
            text
        }
        "yaml" | "yml" => serde_yaml::to_string(records)?,
        other => {
            bail!("unsupported dataset extension `{other}` (expected json, jsonl, yaml or yml)")
        }
    };
    std::fs::write(path, text)
        .with_context(|| format!("failed to write dataset {}", path.display()))?;
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
