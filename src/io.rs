//! I/O utilities for run inputs and artifacts
//!
//! Inputs are newline-delimited JSON (incidents, predictions) and JSON
//! documents (splits). Any unreadable file or unparseable line aborts the run.

use crate::error::{AppError, Result};
use crate::models::{IncidentRecord, PredictionRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read a newline-delimited JSON file, skipping blank lines
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| AppError::MalformedInput {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        items.push(item);
    }

    debug!(path = %path.display(), count = items.len(), "Read JSONL records");
    Ok(items)
}

/// Write one JSON object per line
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, items: &[T]) -> Result<PathBuf> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!(path = %path.display(), count = items.len(), "Wrote JSONL artifact");
    Ok(path.to_path_buf())
}

/// Read a single JSON document
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AppError::MalformedInput {
        path: path.to_path_buf(),
        line: e.line(),
        message: e.to_string(),
    })
}

/// Write a pretty-printed JSON document
pub fn write_json_pretty<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<PathBuf> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(path = %path.display(), "Wrote JSON artifact");
    Ok(path.to_path_buf())
}

/// Write a UTF-8 text artifact (Markdown reports)
pub fn write_text(path: impl AsRef<Path>, contents: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, contents)?;

    info!(path = %path.display(), "Wrote text artifact");
    Ok(path.to_path_buf())
}

pub fn load_incidents(path: impl AsRef<Path>) -> Result<Vec<IncidentRecord>> {
    read_jsonl(path)
}

pub fn load_predictions(path: impl AsRef<Path>) -> Result<Vec<PredictionRecord>> {
    read_jsonl(path)
}

/// Key records by incident id; a later duplicate replaces an earlier one
pub fn index_by_id<T, F>(records: Vec<T>, id_of: F) -> BTreeMap<String, T>
where
    F: Fn(&T) -> &str,
{
    let mut index = BTreeMap::new();
    for record in records {
        index.insert(id_of(&record).to_string(), record);
    }
    index
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use tempfile::tempdir;

    #[test]
    fn test_jsonl_round_trip_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/incidents.jsonl");

        let records = vec![
            IncidentRecord::new("a", "First.").with_labels(Field::Impact, ["delay"]),
            IncidentRecord::new("b", "Second."),
        ];
        write_jsonl(&path, &records).unwrap();

        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push_str("\n   \n");
        fs::write(&path, contents).unwrap();

        let loaded = load_incidents(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{\"incident_id\":\"a\"}\nnot json\n").unwrap();

        let err = load_incidents(&path).unwrap_err();
        assert!(matches!(err, AppError::MalformedInput { line: 2, .. }));
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_predictions("/nonexistent/preds.jsonl").unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_index_by_id_last_wins() {
        let records = vec![
            IncidentRecord::new("a", "old"),
            IncidentRecord::new("a", "new"),
        ];
        let index = index_by_id(records, |r| r.incident_id.as_str());
        assert_eq!(index.len(), 1);
        assert_eq!(index["a"].text, "new");
    }
}
