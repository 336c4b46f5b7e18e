//! Session key/value persistence.
//!
//! All keys of one session live in a single store. Writes to different keys
//! are independent: there is no transaction spanning keys, so callers must
//! tolerate a partially applied multi-key update.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::write_atomic;

/// Durable string key/value store shared by every page of a session.
///
/// Methods take `&self`: a store is shared by the ledger, the timer and the
/// guard within one page context.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process store. State lives as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, for assertions.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file (`.stagegate/state/session.json`).
///
/// A missing file reads as empty. Every write re-reads the file, applies the
/// change and replaces the file atomically (temp file + rename). Two writers
/// on the same file are last-write-wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every entry. Missing file is an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "session file missing, treating as empty");
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read session store {}", self.path.display()))?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&contents)
            .with_context(|| format!("parse session store {}", self.path.display()))?;
        Ok(entries)
    }

    fn update<F: FnOnce(&mut BTreeMap<String, String>) -> bool>(&self, apply: F) -> Result<()> {
        let mut entries = self.load()?;
        if !apply(&mut entries) {
            return Ok(());
        }
        debug!(path = %self.path.display(), keys = entries.len(), "writing session store");
        write_entries(&self.path, &entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            let previous = entries.insert(key.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// Write an entry map as pretty JSON, atomically.
pub fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(entries)?;
    buf.push('\n');
    write_atomic(path, &buf, "json.tmp")
}
