//! The mistake book: words a learner missed, kept in order of first miss.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{normalize_key, WordRef};
use crate::traits::{ListFilter, MistakeBook};

/// A missed word and its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeEntry {
    pub word: WordRef,
    /// Number of wrong answers recorded for this word.
    pub attempts: u32,
    pub mastered: bool,
    pub first_missed_at: DateTime<Utc>,
    pub last_missed_at: DateTime<Utc>,
}

/// In-memory mistake book with optional JSON persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MistakeLog {
    entries: Vec<MistakeEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl MistakeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a log from a JSON file. A missing file yields an empty log.
    pub fn load_json(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mistake log from {}", path.display()))?;
        let mut log: MistakeLog =
            serde_json::from_str(&content).context("failed to parse mistake log JSON")?;
        log.reindex();
        Ok(log)
    }

    /// Save the log as JSON, replacing the file atomically.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize mistake log")?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path)
            .with_context(|| format!("failed to write mistake log to {}", path.display()))?;
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.word.key.clone(), i))
            .collect();
    }
}

impl MistakeBook for MistakeLog {
    fn record(&mut self, word: &WordRef) {
        let now = Utc::now();
        match self.index.get(&word.key) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.attempts += 1;
                entry.mastered = false;
                entry.last_missed_at = now;
                entry.word = word.clone();
            }
            None => {
                self.index.insert(word.key.clone(), self.entries.len());
                self.entries.push(MistakeEntry {
                    word: word.clone(),
                    attempts: 1,
                    mastered: false,
                    first_missed_at: now,
                    last_missed_at: now,
                });
            }
        }
        tracing::debug!("recorded miss for '{}'", word.key);
    }

    fn list(&self, filter: ListFilter) -> Box<dyn Iterator<Item = &MistakeEntry> + '_> {
        Box::new(self.entries.iter().filter(move |e| filter.accepts(e)))
    }

    fn mark_mastered(&mut self, key: &str) {
        if let Some(&i) = self.index.get(&normalize_key(key)) {
            self.entries[i].mastered = true;
        }
    }

    fn get(&self, key: &str) -> Option<&MistakeEntry> {
        self.index
            .get(&normalize_key(key))
            .map(|&i| &self.entries[i])
    }

    fn forget(&mut self, key: &str) -> bool {
        let key = normalize_key(key);
        match self.index.remove(&key) {
            Some(i) => {
                self.entries.remove(i);
                self.reindex();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{GradingEvent, GradingSink};
    use uuid::Uuid;

    fn word(key: &str) -> WordRef {
        WordRef {
            key: key.into(),
            text: key.into(),
            gloss: format!("gloss of {key}"),
            grade: 1,
        }
    }

    fn keys(book: &MistakeLog, filter: ListFilter) -> Vec<String> {
        book.list(filter).map(|e| e.word.key.clone()).collect()
    }

    #[test]
    fn record_inserts_then_increments() {
        let mut book = MistakeLog::new();
        book.record(&word("dog"));
        book.record(&word("dog"));
        let entry = book.get("dog").unwrap();
        assert_eq!(entry.attempts, 2);
        assert!(!entry.mastered);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn mastered_entries_leave_default_listing_and_remiss_restores() {
        let mut book = MistakeLog::new();
        book.record(&word("dog"));
        book.mark_mastered("dog");
        assert!(keys(&book, ListFilter::default()).is_empty());
        assert_eq!(keys(&book, ListFilter::Mastered), vec!["dog"]);

        book.record(&word("dog"));
        let entry = book.get("dog").unwrap();
        assert!(!entry.mastered);
        assert_eq!(entry.attempts, 2);
        assert_eq!(keys(&book, ListFilter::default()), vec!["dog"]);
    }

    #[test]
    fn mark_mastered_unknown_word_is_noop() {
        let mut book = MistakeLog::new();
        book.mark_mastered("ghost");
        book.mark_mastered("ghost");
        assert!(book.is_empty());
    }

    #[test]
    fn listing_keeps_first_miss_order_and_is_reiterable() {
        let mut book = MistakeLog::new();
        for key in ["zebra", "apple", "mango"] {
            book.record(&word(key));
        }
        book.record(&word("zebra"));
        assert_eq!(keys(&book, ListFilter::All), vec!["zebra", "apple", "mango"]);
        assert_eq!(book.pending().count(), 3);
        assert_eq!(book.pending().count(), 3);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut book = MistakeLog::new();
        book.record(&word("dog"));
        book.mark_mastered("  DOG ");
        assert!(book.get("Dog").unwrap().mastered);
    }

    #[test]
    fn forget_removes_and_reindexes() {
        let mut book = MistakeLog::new();
        book.record(&word("a"));
        book.record(&word("b"));
        book.record(&word("c"));
        assert!(book.forget("a"));
        assert!(!book.forget("a"));
        book.record(&word("c"));
        assert_eq!(book.get("c").unwrap().attempts, 2);
        assert_eq!(keys(&book, ListFilter::All), vec!["b", "c"]);
    }

    #[test]
    fn grading_sink_records_only_misses() {
        let mut book = MistakeLog::new();
        let event = |key: &str, correct| GradingEvent {
            question_id: Uuid::new_v4(),
            tier: 1,
            word: word(key),
            correct,
        };
        book.on_graded(&event("cat", true));
        book.on_graded(&event("dog", false));
        assert_eq!(keys(&book, ListFilter::All), vec!["dog"]);
    }

    #[test]
    fn json_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mistakes.json");
        let mut book = MistakeLog::new();
        book.record(&word("dog"));
        book.record(&word("cat"));
        book.mark_mastered("cat");
        book.save_json(&path).unwrap();

        let mut loaded = MistakeLog::load_json(&path).unwrap();
        assert_eq!(keys(&loaded, ListFilter::default()), vec!["dog"]);
        loaded.record(&word("cat"));
        assert_eq!(loaded.get("cat").unwrap().attempts, 2);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let book = MistakeLog::load_json(&dir.path().join("none.json")).unwrap();
        assert!(book.is_empty());
    }
}
