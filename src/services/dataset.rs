//! Utterance dataset paging
//!
//! Reads one page of records at a time from a CSV file (header names become
//! field keys) or a JSON-lines file (one object per line).

use crate::model::Row;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed JSON on line {line} of {path}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Line {line} of {path} is not a JSON object")]
    NotAnObject { path: PathBuf, line: usize },
}

/// One page of records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Index of the first record in this page
    pub offset: usize,
    pub rows: Vec<Row>,
    /// Whether records exist past this page
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    JsonLines,
}

impl Format {
    fn of(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => Format::JsonLines,
            _ => Format::Csv,
        }
    }
}

/// Read `limit` records starting at `offset`
pub fn load_page(path: &Path, offset: usize, limit: usize) -> Result<Page, DatasetError> {
    // One record past the page tells whether more exist.
    let mut rows = match Format::of(path) {
        Format::Csv => read_csv(path, offset, limit + 1)?,
        Format::JsonLines => read_json_lines(path, offset, limit + 1)?,
    };
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    Ok(Page {
        offset,
        rows,
        has_more,
    })
}

fn open(path: &Path) -> Result<File, DatasetError> {
    File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv(path: &Path, offset: usize, take: usize) -> Result<Vec<Row>, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_reader(open(path)?);
    let headers = reader.headers().map_err(csv_err)?.clone();

    let mut rows = Vec::with_capacity(take);
    for record in reader.records().skip(offset).take(take) {
        let record = record.map_err(csv_err)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(key, cell)| (key.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_json_lines(path: &Path, offset: usize, take: usize) -> Result<Vec<Row>, DatasetError> {
    let reader = BufReader::new(open(path)?);
    let mut rows = Vec::with_capacity(take);

    let lines = reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true))
        .skip(offset)
        .take(take);

    for (index, line) in lines {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&line).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        match value {
            Value::Object(row) => rows.push(row),
            _ => {
                return Err(DatasetError::NotAnObject {
                    path: path.to_path_buf(),
                    line: index + 1,
                })
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::field_text;
    use std::fs;

    fn csv_fixture(dir: &Path, n: usize) -> PathBuf {
        let path = dir.join("utterances.csv");
        let mut contents = String::from("text,intent\n");
        for i in 0..n {
            contents.push_str(&format!("utterance {},intent_{}\n", i, i % 3));
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_csv_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_fixture(dir.path(), 25);

        let first = load_page(&path, 0, 10).unwrap();
        assert_eq!(first.rows.len(), 10);
        assert!(first.has_more);
        assert_eq!(field_text(&first.rows[0], "text"), "utterance 0");
        assert_eq!(field_text(&first.rows[0], "intent"), "intent_0");

        let last = load_page(&path, 20, 10).unwrap();
        assert_eq!(last.offset, 20);
        assert_eq!(last.rows.len(), 5);
        assert!(!last.has_more);
        assert_eq!(field_text(&last.rows[4], "text"), "utterance 24");
    }

    #[test]
    fn test_exact_page_boundary_has_no_more() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_fixture(dir.path(), 20);
        let page = load_page(&path, 10, 10).unwrap();
        assert_eq!(page.rows.len(), 10);
        assert!(!page.has_more);
    }

    #[test]
    fn test_json_lines_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utterances.jsonl");
        fs::write(
            &path,
            "{\"text\":\"hi\",\"confidence\":0.9}\n\n{\"text\":\"bye\"}\n{\"text\":\"ok\"}\n",
        )
        .unwrap();

        let page = load_page(&path, 1, 1).unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(field_text(&page.rows[0], "text"), "bye");
        assert!(page.has_more);
    }

    #[test]
    fn test_json_lines_rejects_non_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "[1, 2]\n").unwrap();
        assert!(matches!(
            load_page(&path, 0, 10),
            Err(DatasetError::NotAnObject { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_page(&dir.path().join("none.csv"), 0, 10),
            Err(DatasetError::Io { .. })
        ));
    }
}
