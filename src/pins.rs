//! Per-user pinned keywords.
//!
//! Stored as a JSON object mapping an opaque user id to a list of keys.
//! A user's set is created on first pin and never expires.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::Result;
use crate::store_io::{read_json_or_default, write_json_atomic};

pub type PinMap = BTreeMap<String, Vec<String>>;

pub trait PinStore: Send + Sync {
    fn load_all(&self) -> Result<PinMap>;
    fn save_all(&self, pins: &PinMap) -> Result<()>;

    fn pins(&self, user: &str) -> Result<Vec<String>> {
        Ok(self.load_all()?.remove(user).unwrap_or_default())
    }

    /// Pin `key` for `user`. Pinning twice is a no-op.
    fn pin(&self, user: &str, key: &str) -> Result<Vec<String>> {
        let mut all = self.load_all()?;
        let list = all.entry(user.to_string()).or_default();
        if !list.iter().any(|k| k == key) {
            list.push(key.to_string());
        }
        let result = list.clone();
        self.save_all(&all)?;
        Ok(result)
    }

    fn unpin(&self, user: &str, key: &str) -> Result<Vec<String>> {
        let mut all = self.load_all()?;
        let list = all.entry(user.to_string()).or_default();
        list.retain(|k| k != key);
        let result = list.clone();
        self.save_all(&all)?;
        Ok(result)
    }

    fn clear(&self, user: &str) -> Result<()> {
        let mut all = self.load_all()?;
        all.insert(user.to_string(), Vec::new());
        self.save_all(&all)
    }
}

#[derive(Debug, Clone)]
pub struct JsonPinStore {
    path: PathBuf,
}

impl JsonPinStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PinStore for JsonPinStore {
    fn load_all(&self) -> Result<PinMap> {
        read_json_or_default(&self.path)
    }

    fn save_all(&self, pins: &PinMap) -> Result<()> {
        write_json_atomic(&self.path, pins)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPinStore {
    pins: Mutex<PinMap>,
}

impl PinStore for MemoryPinStore {
    fn load_all(&self) -> Result<PinMap> {
        Ok(self.pins.lock()?.clone())
    }

    fn save_all(&self, pins: &PinMap) -> Result<()> {
        *self.pins.lock()? = pins.clone();
        Ok(())
    }
}
