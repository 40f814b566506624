//! # Key-Value Store
//!
//! The persistence seam under the repository: a minimal string key-value
//! contract with an in-memory implementation for tests and ephemeral
//! sessions, and a single-file JSON implementation with atomic writes.
//!
//! ## Atomic saves
//!
//! `FileStore::set` never leaves a partial write behind:
//!
//! 1. Serialize the full key map to JSON
//! 2. Write to a temporary sibling file (`.tmp`)
//! 3. Sync to disk (fsync)
//! 4. Rename over the target (atomic on most filesystems)
//!
//! There is no locking: the concurrency model is a single logical writer
//! with last-write-wins semantics.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::errors::{CoreError, CoreResult};

/// Minimal synchronous key-value contract.
///
/// `get` distinguishes "key absent" (`Ok(None)`) from "store unreadable"
/// (`Err`); callers that must fail open handle the latter themselves.
pub trait KeyValueStore {
    /// Read the value under a key, if present.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Write the value under a key, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> CoreResult<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Single-file JSON store.
///
/// The whole store is one JSON object mapping keys to string values. A
/// missing file reads as empty; an unparseable file is surfaced as a
/// `StoreError` for the caller to degrade on.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path. The file is created on
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> CoreResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let mut file = File::open(&self.path).map_err(|e| {
            CoreError::store_error(format!("open {}", self.path.display()), e.to_string())
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            CoreError::store_error(format!("read {}", self.path.display()), e.to_string())
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            CoreError::store_error(format!("parse {}", self.path.display()), e.to_string())
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| CoreError::SerializationError {
                reason: e.to_string(),
            })?;

        let tmp_path = self.path.with_extension("tmp");

        let mut tmp_file = File::create(&tmp_path).map_err(|e| {
            CoreError::store_error(format!("create {}", tmp_path.display()), e.to_string())
        })?;

        tmp_file.write_all(json.as_bytes()).map_err(|e| {
            CoreError::store_error(format!("write {}", tmp_path.display()), e.to_string())
        })?;

        tmp_file.sync_all().map_err(|e| {
            CoreError::store_error(format!("sync {}", tmp_path.display()), e.to_string())
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CoreError::store_error(format!("rename to {}", self.path.display()), e.to_string())
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        // Tolerate a corrupt file on write: the new value replaces it
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
