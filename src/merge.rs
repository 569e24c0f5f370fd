//! Merging and deduplication of normalized sources.
//!
//! Sources are concatenated in arrival order with AdminEdit rows last, then
//! deduplicated twice:
//!
//! 1. by `key`, keeping the **last** occurrence (later sources and admin
//!    edits override earlier rows);
//! 2. by `description`, keeping the **first** occurrence that survived step 1.
//!
//! The two passes deliberately run in opposite directions. Both directions
//! can be changed through [`DedupPolicy`]; the default reproduces the rule
//! above. A surviving row keeps its own position in the concatenated
//! sequence.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::models::KeywordEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    #[default]
    LastWins,
    FirstWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescriptionPolicy {
    #[default]
    FirstWins,
    LastWins,
    /// Skip description deduplication entirely.
    KeepAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DedupPolicy {
    pub key: KeyPolicy,
    pub description: DescriptionPolicy,
}

/// Concatenate `sources` (in order) followed by `admin_edits`, then deduplicate.
pub fn merge_sources<I>(
    sources: I,
    admin_edits: Vec<KeywordEntry>,
    policy: DedupPolicy,
) -> Vec<KeywordEntry>
where
    I: IntoIterator<Item = Vec<KeywordEntry>>,
{
    let mut all: Vec<KeywordEntry> = sources.into_iter().flatten().collect();
    all.extend(admin_edits);
    dedup(all, policy)
}

/// Apply both deduplication passes to an already concatenated sequence.
pub fn dedup(entries: Vec<KeywordEntry>, policy: DedupPolicy) -> Vec<KeywordEntry> {
    let by_key = match policy.key {
        KeyPolicy::LastWins => keep_last_by(entries, |e| e.key.clone()),
        KeyPolicy::FirstWins => keep_first_by(entries, |e| e.key.clone()),
    };

    match policy.description {
        DescriptionPolicy::FirstWins => keep_first_by(by_key, |e| e.description.clone()),
        DescriptionPolicy::LastWins => keep_last_by(by_key, |e| e.description.clone()),
        DescriptionPolicy::KeepAll => by_key,
    }
}

fn keep_first_by<K, F>(entries: Vec<KeywordEntry>, key_of: F) -> Vec<KeywordEntry>
where
    K: Eq + Hash,
    F: Fn(&KeywordEntry) -> K,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(key_of(e)))
        .collect()
}

fn keep_last_by<K, F>(entries: Vec<KeywordEntry>, key_of: F) -> Vec<KeywordEntry>
where
    K: Eq + Hash,
    F: Fn(&KeywordEntry) -> K,
{
    let mut last: HashMap<K, usize> = HashMap::new();
    for (i, e) in entries.iter().enumerate() {
        last.insert(key_of(e), i);
    }
    entries
        .into_iter()
        .enumerate()
        .filter(|(i, e)| last.get(&key_of(e)) == Some(i))
        .map(|(_, e)| e)
        .collect()
}
