//! Golden-file checks for stored inventory records.
//!
//! Values are compared as canonical pretty JSON (object keys sorted). Set
//! `BLOCKSTASH_UPDATE_SNAPSHOTS=1` to rewrite the golden files instead.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that switches snapshot checks to update mode.
pub const UPDATE_SNAPSHOTS_ENV: &str = "BLOCKSTASH_UPDATE_SNAPSHOTS";

/// Assert that `value` serializes to the JSON stored at `golden`.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(golden: P, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    compare(golden.as_ref(), value)
}

/// Assert that the JSON file at `actual` matches the JSON stored at `golden`.
///
/// Used to pin the on-disk layout of record files written by the store.
pub fn assert_file_snapshot<P: AsRef<Path>, Q: AsRef<Path>>(golden: P, actual: Q) -> Result<()> {
    let actual = actual.as_ref();
    let text = fs::read_to_string(actual)
        .with_context(|| format!("Failed to read {}", actual.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", actual.display()))?;
    compare(golden.as_ref(), value)
}

fn compare(golden: &Path, value: Value) -> Result<()> {
    let actual = canonical_json(value)?;

    if should_update_snapshots() {
        if let Some(parent) = golden.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        return fs::write(golden, &actual)
            .with_context(|| format!("Failed to write snapshot {}", golden.display()));
    }

    let expected = fs::read_to_string(golden).with_context(|| {
        format!(
            "Snapshot missing at {} (run with {}=1 to create it)",
            golden.display(),
            UPDATE_SNAPSHOTS_ENV
        )
    })?;
    let expected = canonical_json(
        serde_json::from_str(&expected)
            .with_context(|| format!("Snapshot {} is not valid JSON", golden.display()))?,
    )?;

    if expected != actual {
        anyhow::bail!(
            "Snapshot mismatch at {}\n--- expected\n{expected}\n--- actual\n{actual}",
            golden.display()
        );
    }
    Ok(())
}

fn should_update_snapshots() -> bool {
    matches!(
        std::env::var(UPDATE_SNAPSHOTS_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn canonical_json(value: Value) -> Result<String> {
    let mut s = serde_json::to_string_pretty(&sort_keys(value))
        .context("Failed to format snapshot JSON")?;
    s.push('\n');
    Ok(s)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
