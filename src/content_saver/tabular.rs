//! Append-only CSV tables deduplicated by a key column.
//!
//! The key column of an existing file is read once when the table is opened;
//! after that every append checks and extends the in-memory key set under
//! the same lock that guards the file, so a key is written at most once
//! across runs and across concurrent writers.

use log::{debug, info};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::crawl_engine::{CrawlError, CrawlResult};

#[derive(Debug)]
struct TableState {
    keys: HashSet<String>,
    header_written: bool,
}

#[derive(Debug)]
pub struct TabularStore {
    path: PathBuf,
    headers: Vec<String>,
    key_index: usize,
    state: Mutex<TableState>,
}

impl TabularStore {
    /// Open (or prepare to create) the table at `path`.
    ///
    /// `key_column` must be one of `headers`. When the file already exists
    /// its own header row decides where the key column is.
    pub fn open(path: impl Into<PathBuf>, headers: &[&str], key_column: &str) -> CrawlResult<Self> {
        let path = path.into();
        let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
        let key_index = headers
            .iter()
            .position(|h| h == key_column)
            .ok_or_else(|| CrawlError::Config(format!("{key_column} is not a column of {}", path.display())))?;

        let (keys, header_written) = if path.exists() {
            load_keys(&path, key_column, key_index)?
        } else {
            (HashSet::new(), false)
        };

        info!(
            "Opened {} with {} existing rows",
            path.display(),
            keys.len()
        );

        Ok(Self {
            path,
            headers,
            key_index,
            state: Mutex::new(TableState {
                keys,
                header_written,
            }),
        })
    }

    /// Append `record` unless its key is already present.
    ///
    /// Returns whether a row was written. The header row is written first
    /// when the file is new or empty.
    pub fn append(&self, record: &[String]) -> CrawlResult<bool> {
        if record.len() != self.headers.len() {
            return Err(CrawlError::persistence(format!(
                "{}: expected {} fields, got {}",
                self.path.display(),
                self.headers.len(),
                record.len()
            )));
        }
        let key = record[self.key_index].as_str();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.keys.contains(key) {
            debug!("Row already present in {}: {key}", self.path.display());
            return Ok(false);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if !state.header_written {
            writer.write_record(&self.headers)?;
        }
        writer.write_record(record)?;
        writer.flush()?;

        state.header_written = true;
        state.keys.insert(key.to_string());
        Ok(true)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .contains(key)
    }

    /// Number of distinct rows in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the key column of an existing table.
///
/// Returns the keys and whether a header row is present.
fn load_keys(
    path: &Path,
    key_column: &str,
    default_index: usize,
) -> CrawlResult<(HashSet<String>, bool)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let existing_headers = reader.headers()?.clone();
    if existing_headers.is_empty() {
        return Ok((HashSet::new(), false));
    }

    let index = existing_headers
        .iter()
        .position(|h| h == key_column)
        .unwrap_or(default_index);

    let mut keys = HashSet::new();
    for row in reader.records() {
        let row = row?;
        if let Some(key) = row.get(index).filter(|k| !k.is_empty()) {
            keys.insert(key.to_string());
        }
    }
    Ok((keys, true))
}
