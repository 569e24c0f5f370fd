//! Per-user interactive selection.
//!
//! A [`SessionState`] is an explicit value owned by the caller and passed
//! into queries; nothing here is global. One state belongs to one user.

use serde::{Deserialize, Serialize};

use crate::lookup::KnowledgeBase;
use crate::models::KeywordEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub selected_keyword: Option<String>,
    #[serde(default)]
    pub selected_topics: Vec<String>,
    #[serde(default)]
    pub multi_filter_keywords: Vec<String>,
}

impl SessionState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn select_keyword(mut self, key: impl Into<String>) -> Self {
        self.selected_keyword = Some(key.into());
        self
    }

    pub fn select_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter_keywords<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_filter_keywords = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Drop every selection, keeping identity and capability.
    pub fn clear_selection(&mut self) {
        self.selected_keyword = None;
        self.selected_topics.clear();
        self.multi_filter_keywords.clear();
    }
}

/// Entries to display for `state`: the selected keyword if any, otherwise
/// the multi-keyword filter (narrowed by the selected topics), otherwise
/// nothing.
pub fn answer<'a>(kb: &'a KnowledgeBase, state: &SessionState) -> Vec<&'a KeywordEntry> {
    if let Some(key) = state.selected_keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        return kb.lookup_exact(key).into_iter().collect();
    }
    if !state.multi_filter_keywords.is_empty() {
        return kb.filter(&state.selected_topics, &state.multi_filter_keywords);
    }
    Vec::new()
}
