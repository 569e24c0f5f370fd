//! The consolidated knowledge base and its query interface.
//!
//! | Query | Match rule | Result |
//! |-------|------------|--------|
//! | [`KnowledgeBase::lookup_exact`] | exact key, then case-insensitive key | at most one entry |
//! | [`KnowledgeBase::lookup_contains`] | case-insensitive substring of key | all matches, in order |
//! | [`KnowledgeBase::suggest`] | Levenshtein distance on keys | best candidates first |
//!
//! An empty (or whitespace-only) fragment passed to `lookup_contains`
//! matches every entry.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::KeywordEntry;

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KeywordEntry>,
    by_key: HashMap<String, usize>,
}

/// A keyword suggestion with its similarity score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub key: String,
    pub score: f64,
}

impl KnowledgeBase {
    /// Wrap an already deduplicated sequence.
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        let mut by_key = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            by_key.entry(e.key.clone()).or_insert(i);
        }
        Self { entries, by_key }
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup_exact(&self, key: &str) -> Option<&KeywordEntry> {
        if let Some(&i) = self.by_key.get(key) {
            return self.entries.get(i);
        }
        let wanted = key.to_lowercase();
        self.entries.iter().find(|e| e.key.to_lowercase() == wanted)
    }

    /// The description for `key`, or `not_found` when there is no match.
    pub fn describe<'a>(&'a self, key: &str, not_found: &'a str) -> &'a str {
        self.lookup_exact(key)
            .map(|e| e.description.as_str())
            .unwrap_or(not_found)
    }

    pub fn lookup_contains(&self, fragment: &str) -> Vec<&KeywordEntry> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| e.key.to_lowercase().contains(&needle))
            .collect()
    }

    /// Distinct topics in first-appearance order.
    pub fn list_topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for e in &self.entries {
            if !topics.contains(&e.topic.as_str()) {
                topics.push(&e.topic);
            }
        }
        topics
    }

    pub fn list_keywords_for_topic(&self, topic: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.topic == topic)
            .map(|e| e.key.as_str())
            .collect()
    }

    /// Keywords belonging to any of `topics`; all keywords when `topics` is empty.
    pub fn keywords_in_topics(&self, topics: &[String]) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| topics.is_empty() || topics.contains(&e.topic))
            .map(|e| e.key.as_str())
            .collect()
    }

    /// Entries matching both the topic and keyword selections. An empty
    /// selection does not filter.
    pub fn filter(&self, topics: &[String], keywords: &[String]) -> Vec<&KeywordEntry> {
        self.entries
            .iter()
            .filter(|e| topics.is_empty() || topics.contains(&e.topic))
            .filter(|e| keywords.is_empty() || keywords.contains(&e.key))
            .collect()
    }

    /// Approximate keyword matches, most similar first.
    ///
    /// Candidates whose edit distance exceeds half the longer string are
    /// dropped. Ties keep knowledge base order.
    pub fn suggest(&self, text: &str, limit: usize) -> Vec<Suggestion> {
        let input = text.trim().to_lowercase();
        if input.is_empty() {
            return Vec::new();
        }
        let input_len = input.chars().count();

        let mut scored: Vec<Suggestion> = self
            .entries
            .iter()
            .filter_map(|e| {
                let candidate = e.key.to_lowercase();
                let max_len = input_len.max(candidate.chars().count());
                let dist = strsim::levenshtein(&input, &candidate);
                if dist > max_len / 2 {
                    return None;
                }
                Some(Suggestion {
                    key: e.key.clone(),
                    score: 1.0 - dist as f64 / max_len as f64,
                })
            })
            .collect();

        // Stable sort keeps original order among equal scores.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }

    /// Pinned keys grouped by topic. Pins whose key no longer exists are
    /// dropped.
    pub fn pinned_by_topic(&self, pins: &[String]) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pin in pins {
            if let Some(entry) = self.by_key.get(pin).and_then(|&i| self.entries.get(i)) {
                let keys = grouped.entry(entry.topic.clone()).or_default();
                if !keys.contains(&entry.key) {
                    keys.push(entry.key.clone());
                }
            }
        }
        for keys in grouped.values_mut() {
            keys.sort();
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            KeywordEntry::new("học phí", "Tuition fees", "cc"),
            KeywordEntry::new("Học bổng", "Scholarships", "hb"),
            KeywordEntry::new("khác", "Other", "other"),
            KeywordEntry::new("visa", "Visa support", "cc"),
        ])
    }

    fn keys(entries: &[&KeywordEntry]) -> Vec<String> {
        entries.iter().map(|e| e.key.clone()).collect()
    }

    #[test]
    fn contains_is_case_insensitive_and_ordered() {
        let kb = kb();
        assert_eq!(keys(&kb.lookup_contains("học")), vec!["học phí", "Học bổng"]);
        assert_eq!(keys(&kb.lookup_contains("HỌC")), vec!["học phí", "Học bổng"]);
    }

    #[test]
    fn contains_empty_fragment_returns_everything() {
        let kb = kb();
        assert_eq!(kb.lookup_contains("").len(), 4);
        assert_eq!(kb.lookup_contains("   ").len(), 4);
    }

    #[test]
    fn contains_no_match_is_empty() {
        assert!(kb().lookup_contains("zzz").is_empty());
    }

    #[test]
    fn exact_lookup_prefers_exact_case() {
        let kb = KnowledgeBase::new(vec![
            KeywordEntry::new("Visa", "upper", "a"),
            KeywordEntry::new("visa", "lower", "a"),
        ]);
        assert_eq!(kb.lookup_exact("visa").unwrap().description, "lower");
        assert_eq!(kb.lookup_exact("Visa").unwrap().description, "upper");
        assert_eq!(kb.lookup_exact("VISA").unwrap().description, "upper");
    }

    #[test]
    fn exact_lookup_is_idempotent() {
        let kb = kb();
        let first = kb.lookup_exact("visa").cloned();
        let second = kb.lookup_exact("visa").cloned();
        assert_eq!(first, second);
        assert!(kb.lookup_exact("missing").is_none());
    }

    #[test]
    fn describe_falls_back_to_sentinel() {
        let kb = kb();
        assert_eq!(kb.describe("visa", "nope"), "Visa support");
        assert_eq!(kb.describe("missing", "nope"), "nope");
    }

    #[test]
    fn topics_and_keywords() {
        let kb = kb();
        assert_eq!(kb.list_topics(), vec!["cc", "hb", "other"]);
        assert_eq!(kb.list_keywords_for_topic("cc"), vec!["học phí", "visa"]);
        assert!(kb.list_keywords_for_topic("nope").is_empty());
    }

    #[test]
    fn filter_by_topics_and_keywords() {
        let kb = kb();
        let cc = vec!["cc".to_string()];
        assert_eq!(keys(&kb.filter(&cc, &[])), vec!["học phí", "visa"]);
        assert_eq!(
            keys(&kb.filter(&cc, &["visa".to_string(), "khác".to_string()])),
            vec!["visa"]
        );
        assert_eq!(kb.filter(&[], &[]).len(), 4);
        assert_eq!(kb.keywords_in_topics(&["hb".to_string()]), vec!["Học bổng"]);
    }

    #[test]
    fn suggest_orders_by_similarity() {
        let kb = KnowledgeBase::new(vec![
            KeywordEntry::new("hours", "a", "t"),
            KeywordEntry::new("house", "b", "t"),
            KeywordEntry::new("visa", "c", "t"),
        ]);
        let s = kb.suggest("hous", 5);
        let ks: Vec<&str> = s.iter().map(|s| s.key.as_str()).collect();
        // Both are one edit away; original order breaks the tie.
        assert_eq!(ks, vec!["hours", "house"]);
        assert!(s[0].score > 0.0 && s[0].score <= 1.0);
        assert_eq!(kb.suggest("hous", 1).len(), 1);
        assert!(kb.suggest("", 5).is_empty());
    }

    #[test]
    fn suggest_prefers_exact() {
        let kb = KnowledgeBase::new(vec![
            KeywordEntry::new("visas", "a", "t"),
            KeywordEntry::new("visa", "b", "t"),
        ]);
        let s = kb.suggest("VISA", 5);
        assert_eq!(s[0].key, "visa");
        assert!((s[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pinned_grouping_skips_stale_pins() {
        let kb = kb();
        let grouped = kb.pinned_by_topic(&[
            "visa".to_string(),
            "học phí".to_string(),
            "gone".to_string(),
        ]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["cc"], vec!["học phí", "visa"]);
    }

    #[test]
    fn suggest_counts_diacritics_as_single_edits() {
        let kb = kb();
        let s = kb.suggest("hoc phi", 5);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].key, "học phí");
        assert!((s[0].score - 5.0 / 7.0).abs() < 1e-9);
    }
}
