//! Core trait definitions for graph stores and mistake books.
//!
//! `GraphStore` is implemented by the adapters in `wordtower-store`;
//! `MistakeBook` by [`crate::mistakes::MistakeLog`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::mistakes::MistakeEntry;
use crate::model::{EdgeKind, Grade, NodeLabel, Word, WordRef};

/// Free-form node/edge properties.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Graph store trait
// ---------------------------------------------------------------------------

/// A property-graph store the builder output is written to and the quiz
/// engine reads from.
///
/// Merges are upserts keyed by `(label, key)`. `BELONGS_TO` and `HAS_ROOT`
/// are functional: merging one replaces the source's previous target.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Human-readable adapter name (e.g. "memory").
    fn name(&self) -> &str;

    /// Create or update a node, merging `properties` over existing ones.
    async fn merge_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError>;

    /// Create or update an edge. Both endpoints must already exist.
    async fn merge_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError>;

    /// Remove every `kind` edge leaving `from_key`. Returns whether any existed.
    async fn remove_edges(&self, kind: EdgeKind, from_key: &str) -> Result<bool, StoreError>;

    /// All words belonging to the grade `tier`, ordered by key.
    async fn query_words_by_grade(&self, tier: u8) -> Result<Vec<Word>, StoreError>;

    /// All words with a `HAS_ROOT` edge to `root`, ordered by key.
    async fn query_family(&self, root: &str) -> Result<Vec<Word>, StoreError>;

    /// Every root with its member count, largest family first.
    async fn query_roots(&self) -> Result<Vec<RootCount>, StoreError>;

    /// Delete a word node and its edges. Returns whether it existed.
    async fn delete_word(&self, key: &str) -> Result<bool, StoreError>;

    /// Write one word together with its grade, root, and edges.
    ///
    /// The default issues the individual merges in dependency order; stores
    /// with transactions override this to apply the unit atomically.
    async fn merge_word(&self, unit: &WordMerge) -> Result<(), StoreError> {
        let word = &unit.word;
        let grade = Grade { tier: word.grade };
        self.merge_node(NodeLabel::Grade, &grade.key(), grade_properties(grade))
            .await?;
        if let Some(root) = &word.root {
            self.merge_node(NodeLabel::Root, root, root_properties(root))
                .await?;
        }
        self.merge_node(NodeLabel::Word, &word.key, word_properties(word)?)
            .await?;
        self.merge_edge(EdgeKind::BelongsTo, &word.key, &grade.key(), PropertyMap::new())
            .await?;
        match &word.root {
            Some(root) => {
                self.merge_edge(EdgeKind::HasRoot, &word.key, root, PropertyMap::new())
                    .await?
            }
            None => {
                self.remove_edges(EdgeKind::HasRoot, &word.key).await?;
            }
        }
        Ok(())
    }

    /// Persist buffered writes, if the adapter buffers any.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One word's complete write unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMerge {
    pub word: Word,
}

/// A root tag and the number of words carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCount {
    pub root: String,
    pub members: usize,
}

/// Encode a word as node properties.
pub fn word_properties(word: &Word) -> Result<PropertyMap, StoreError> {
    match serde_json::to_value(word) {
        Ok(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(StoreError::Corrupt(format!(
            "word encoded as non-object: {other}"
        ))),
        Err(e) => Err(StoreError::Corrupt(e.to_string())),
    }
}

/// Decode a word from node properties.
pub fn word_from_properties(properties: &PropertyMap) -> Result<Word, StoreError> {
    let value = serde_json::Value::Object(
        properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub fn grade_properties(grade: Grade) -> PropertyMap {
    PropertyMap::from([("tier".to_string(), serde_json::Value::from(grade.tier))])
}

pub fn root_properties(tag: &str) -> PropertyMap {
    PropertyMap::from([("tag".to_string(), serde_json::Value::from(tag))])
}

// ---------------------------------------------------------------------------
// Mistake book trait
// ---------------------------------------------------------------------------

/// Which mistake entries a listing yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    /// Entries not yet marked mastered.
    #[default]
    Unmastered,
    Mastered,
    All,
}

impl ListFilter {
    pub fn accepts(&self, entry: &MistakeEntry) -> bool {
        match self {
            ListFilter::Unmastered => !entry.mastered,
            ListFilter::Mastered => entry.mastered,
            ListFilter::All => true,
        }
    }
}

/// Tracks words a learner answered incorrectly.
pub trait MistakeBook {
    /// Count a miss: insert the entry or bump its attempts, and clear
    /// `mastered`.
    fn record(&mut self, word: &WordRef);

    /// Entries matching `filter`, oldest first miss first. Each call
    /// returns a fresh iterator.
    fn list(&self, filter: ListFilter) -> Box<dyn Iterator<Item = &MistakeEntry> + '_>;

    /// Flag a word as mastered. Unknown words are a no-op.
    fn mark_mastered(&mut self, key: &str);

    /// Look up the entry for a word key.
    fn get(&self, key: &str) -> Option<&MistakeEntry>;

    /// Drop a word's entry entirely. Only valid once the word itself has
    /// been deleted from the graph.
    fn forget(&mut self, key: &str) -> bool;

    /// Entries still to review.
    fn pending(&self) -> Box<dyn Iterator<Item = &MistakeEntry> + '_> {
        self.list(ListFilter::default())
    }
}

// ---------------------------------------------------------------------------
// Grading events
// ---------------------------------------------------------------------------

/// Emitted once per graded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingEvent {
    pub question_id: Uuid,
    pub tier: u8,
    pub word: WordRef,
    pub correct: bool,
}

/// Receives grading events from the quiz engine.
pub trait GradingSink {
    fn on_graded(&mut self, event: &GradingEvent);
}

/// Sink that discards every event.
pub struct NoopSink;

impl GradingSink for NoopSink {
    fn on_graded(&mut self, _: &GradingEvent) {}
}

/// A mistake book records every wrong answer it is handed.
impl<B: MistakeBook + ?Sized> GradingSink for B {
    fn on_graded(&mut self, event: &GradingEvent) {
        if !event.correct {
            self.record(&event.word);
        }
    }
}

/// Delete a word from the store and drop its mistake entry with it.
pub async fn purge_word(
    store: &dyn GraphStore,
    book: &mut dyn MistakeBook,
    key: &str,
) -> Result<bool, StoreError> {
    let key = crate::model::normalize_key(key);
    let existed = store.delete_word(&key).await?;
    if existed {
        book.forget(&key);
        tracing::info!("purged word '{key}' and its mistake entry");
    }
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_word() -> Word {
        Word {
            key: "candle".into(),
            text: "candle".into(),
            gloss: "蜡烛".into(),
            grade: 3,
            root: Some("can".into()),
            phonetic: None,
            pos: Some("n.".into()),
            is_phrase: false,
        }
    }

    #[test]
    fn word_properties_roundtrip_through_map() {
        let word = sample_word();
        let props = word_properties(&word).unwrap();
        assert_eq!(props["gloss"], serde_json::json!("蜡烛"));
        assert_eq!(props["grade"], serde_json::json!(3));
        assert_eq!(word_from_properties(&props).unwrap(), word);
    }

    #[test]
    fn word_from_properties_rejects_garbage() {
        let props = PropertyMap::from([("key".to_string(), serde_json::json!(7))]);
        assert!(matches!(
            word_from_properties(&props),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn list_filter_defaults_to_unmastered() {
        assert_eq!(ListFilter::default(), ListFilter::Unmastered);
    }
}
