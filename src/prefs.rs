//! Per-user display preferences (light/dark theme).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::store_io::{read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_all(&self) -> Result<BTreeMap<String, Preferences>> {
        read_json_or_default(&self.path)
    }

    /// Preferences for `user`; unknown users get light mode.
    pub fn get(&self, user: &str) -> Result<Preferences> {
        Ok(self.load_all()?.get(user).copied().unwrap_or_default())
    }

    /// Flip dark mode for `user` and persist it.
    pub fn toggle_theme(&self, user: &str) -> Result<Preferences> {
        let mut all = self.load_all()?;
        let prefs = all.entry(user.to_string()).or_default();
        prefs.dark_mode = !prefs.dark_mode;
        let updated = *prefs;
        write_json_atomic(&self.path, &all)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unknown_user_is_light_and_toggle_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("theme_prefs.json");
        let store = PreferenceStore::new(&path);

        assert!(!store.get("alice").unwrap().dark_mode);
        assert!(store.toggle_theme("alice").unwrap().dark_mode);
        assert!(PreferenceStore::new(&path).get("alice").unwrap().dark_mode);
        assert!(!store.toggle_theme("alice").unwrap().dark_mode);
        assert!(!store.get("bob").unwrap().dark_mode);
    }
}
