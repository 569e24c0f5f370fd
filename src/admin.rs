//! Durable admin edits layered on top of remote data.
//!
//! Edits live in a CSV file with `key word,description,topic` columns and
//! are rewritten in full on every mutation. The write goes to a temporary
//! file in the same directory which is then renamed over the target, so a
//! crash never leaves a half-written file behind. Concurrent admins are not
//! coordinated: the last completed write wins.
//!
//! Every mutation goes through [`AdminEditor`], which checks the admin
//! capability and validates the submission before touching the store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{KbError, Result};
use crate::models::{KeywordEntry, DESCRIPTION_COLUMN, KEY_COLUMN, TOPIC_COLUMN};
use crate::normalize::{parse_table, TopicRule};
use crate::store_io::write_atomic;

/// Persistence boundary for admin edits.
pub trait AdminEditStore: Send + Sync {
    fn load(&self) -> Result<Vec<KeywordEntry>>;
    fn save(&self, entries: &[KeywordEntry]) -> Result<()>;
}

/// File-backed store (full rewrite on save).
#[derive(Debug, Clone)]
pub struct CsvAdminEditStore {
    path: PathBuf,
}

impl CsvAdminEditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AdminEditStore for CsvAdminEditStore {
    fn load(&self) -> Result<Vec<KeywordEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let body = std::fs::read_to_string(&self.path)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_table(&self.path.display().to_string(), &body, TopicRule::Column)
    }

    fn save(&self, entries: &[KeywordEntry]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([KEY_COLUMN, DESCRIPTION_COLUMN, TOPIC_COLUMN])?;
        for e in entries {
            writer.write_record([&e.key, &e.description, &e.topic])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| KbError::Io(e.into_error()))?;

        write_atomic(&self.path, &bytes)
    }
}

/// In-memory store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAdminEditStore {
    entries: Mutex<Vec<KeywordEntry>>,
}

impl MemoryAdminEditStore {
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl AdminEditStore for MemoryAdminEditStore {
    fn load(&self) -> Result<Vec<KeywordEntry>> {
        Ok(self.entries.lock()?.clone())
    }

    fn save(&self, entries: &[KeywordEntry]) -> Result<()> {
        *self.entries.lock()? = entries.to_vec();
        Ok(())
    }
}

/// Reject entries with a blank key, description, or topic.
pub fn validate_entry(entry: &KeywordEntry) -> Result<()> {
    let mut missing = Vec::new();
    if entry.key.trim().is_empty() {
        missing.push(KEY_COLUMN.to_string());
    }
    if entry.description.trim().is_empty() {
        missing.push(DESCRIPTION_COLUMN.to_string());
    }
    if entry.topic.trim().is_empty() {
        missing.push(TOPIC_COLUMN.to_string());
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(KbError::Validation { missing })
    }
}

/// Capability-checked mutations over an [`AdminEditStore`].
pub struct AdminEditor<'a> {
    store: &'a dyn AdminEditStore,
    is_admin: bool,
}

impl<'a> AdminEditor<'a> {
    pub fn new(store: &'a dyn AdminEditStore, is_admin: bool) -> Self {
        Self { store, is_admin }
    }

    fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(KbError::Unauthorized)
        }
    }

    pub fn list(&self) -> Result<Vec<KeywordEntry>> {
        self.store.load()
    }

    /// Add an edit. An existing edit with the same key is replaced in place.
    pub fn add(&self, entry: KeywordEntry) -> Result<()> {
        self.require_admin()?;
        validate_entry(&entry)?;

        let mut entries = self.store.load()?;
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.store.save(&entries)
    }

    /// Replace the edit stored under `key` (which may rename it). When no
    /// edit exists for `key` the new entry is appended, overriding any
    /// remote row with the same key at the next rebuild.
    pub fn update(&self, key: &str, entry: KeywordEntry) -> Result<()> {
        self.require_admin()?;
        validate_entry(&entry)?;

        let mut entries = self.store.load()?;
        // Renaming onto another edited key replaces that edit too.
        if entry.key != key {
            entries.retain(|e| e.key != entry.key);
        }
        match entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.store.save(&entries)
    }

    /// Remove every edit whose key or topic equals `target`.
    pub fn delete(&self, target: &str) -> Result<usize> {
        self.require_admin()?;

        let mut entries = self.store.load()?;
        let before = entries.len();
        entries.retain(|e| e.key != target && e.topic != target);
        let removed = before - entries.len();
        if removed == 0 {
            return Err(KbError::NotFound(target.to_string()));
        }
        self.store.save(&entries)?;
        Ok(removed)
    }

    /// Move every edit from topic `old` to topic `new`.
    pub fn rename_topic(&self, old: &str, new: &str) -> Result<usize> {
        self.require_admin()?;
        if new.trim().is_empty() {
            return Err(KbError::Validation {
                missing: vec![TOPIC_COLUMN.to_string()],
            });
        }

        let mut entries = self.store.load()?;
        let mut renamed = 0;
        for e in entries.iter_mut().filter(|e| e.topic == old) {
            e.topic = new.to_string();
            renamed += 1;
        }
        if renamed == 0 {
            return Err(KbError::NotFound(old.to_string()));
        }
        self.store.save(&entries)?;
        Ok(renamed)
    }
}
