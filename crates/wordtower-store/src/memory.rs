//! In-memory property graph.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wordtower_core::error::StoreError;
use wordtower_core::model::{EdgeKind, Grade, NodeLabel, Word};
use wordtower_core::traits::{
    grade_properties, root_properties, word_from_properties, word_properties, GraphStore,
    PropertyMap, RootCount, WordMerge,
};

/// Nodes by label and the two functional edge kinds as source → target maps.
///
/// `SAME_ROOT` is never stored; it is implied by two words sharing a
/// `has_root` target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct GraphData {
    #[serde(default)]
    pub words: BTreeMap<String, PropertyMap>,
    #[serde(default)]
    pub grades: BTreeMap<String, PropertyMap>,
    #[serde(default)]
    pub roots: BTreeMap<String, PropertyMap>,
    #[serde(default)]
    pub belongs_to: BTreeMap<String, String>,
    #[serde(default)]
    pub has_root: BTreeMap<String, String>,
}

impl GraphData {
    fn nodes_mut(&mut self, label: NodeLabel) -> &mut BTreeMap<String, PropertyMap> {
        match label {
            NodeLabel::Word => &mut self.words,
            NodeLabel::Grade => &mut self.grades,
            NodeLabel::Root => &mut self.roots,
        }
    }

    pub fn merge_node(&mut self, label: NodeLabel, key: &str, properties: PropertyMap) {
        self.nodes_mut(label)
            .entry(key.to_string())
            .or_default()
            .extend(properties);
    }

    pub fn merge_edge(&mut self, kind: EdgeKind, from: &str, to: &str) -> Result<(), StoreError> {
        if !self.words.contains_key(from) {
            return Err(missing(NodeLabel::Word, from));
        }
        let (targets, edges) = match kind {
            EdgeKind::BelongsTo => (&self.grades, &mut self.belongs_to),
            EdgeKind::HasRoot => (&self.roots, &mut self.has_root),
            EdgeKind::SameRoot => {
                if !self.words.contains_key(to) {
                    return Err(missing(NodeLabel::Word, to));
                }
                tracing::debug!("SAME_ROOT {from} -> {to} is derived, not stored");
                return Ok(());
            }
        };
        if !targets.contains_key(to) {
            let label = match kind {
                EdgeKind::BelongsTo => NodeLabel::Grade,
                _ => NodeLabel::Root,
            };
            return Err(missing(label, to));
        }
        let previous = edges.insert(from.to_string(), to.to_string());
        if let Some(previous) = previous.filter(|p| p != to) {
            self.prune(kind, &previous);
        }
        Ok(())
    }

    pub fn remove_edges(&mut self, kind: EdgeKind, from: &str) -> bool {
        let removed = match kind {
            EdgeKind::BelongsTo => self.belongs_to.remove(from),
            EdgeKind::HasRoot => self.has_root.remove(from),
            EdgeKind::SameRoot => None,
        };
        match removed {
            Some(target) => {
                self.prune(kind, &target);
                true
            }
            None => false,
        }
    }

    /// Drop the grade or root node `target` once no edge of `kind` points at it.
    fn prune(&mut self, kind: EdgeKind, target: &str) {
        let (edges, nodes) = match kind {
            EdgeKind::BelongsTo => (&self.belongs_to, &mut self.grades),
            EdgeKind::HasRoot => (&self.has_root, &mut self.roots),
            EdgeKind::SameRoot => return,
        };
        if !edges.values().any(|t| t == target) {
            nodes.remove(target);
            tracing::debug!("pruned orphan {kind} target {target}");
        }
    }

    /// A word with grade and root read from its edges.
    pub fn word(&self, key: &str) -> Result<Word, StoreError> {
        let properties = self
            .words
            .get(key)
            .ok_or_else(|| missing(NodeLabel::Word, key))?;
        let mut word = word_from_properties(properties)?;
        if let Some(grade) = self.belongs_to.get(key) {
            word.grade = grade
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("bad grade key {grade:?}")))?;
        }
        word.root = self.has_root.get(key).cloned();
        Ok(word)
    }

    pub fn words_by_grade(&self, tier: u8) -> Result<Vec<Word>, StoreError> {
        let grade = Grade { tier }.key();
        self.belongs_to
            .iter()
            .filter(|(_, g)| **g == grade)
            .map(|(key, _)| self.word(key))
            .collect()
    }

    pub fn family(&self, root: &str) -> Result<Vec<Word>, StoreError> {
        self.has_root
            .iter()
            .filter(|(_, r)| *r == root)
            .map(|(key, _)| self.word(key))
            .collect()
    }

    pub fn root_counts(&self) -> Vec<RootCount> {
        let mut counts: BTreeMap<&str, usize> =
            self.roots.keys().map(|r| (r.as_str(), 0)).collect();
        for root in self.has_root.values() {
            *counts.entry(root.as_str()).or_default() += 1;
        }
        let mut roots: Vec<RootCount> = counts
            .into_iter()
            .map(|(root, members)| RootCount {
                root: root.to_string(),
                members,
            })
            .collect();
        roots.sort_by(|a, b| b.members.cmp(&a.members).then_with(|| a.root.cmp(&b.root)));
        roots
    }

    pub fn delete_word(&mut self, key: &str) -> bool {
        if self.words.remove(key).is_none() {
            return false;
        }
        self.remove_edges(EdgeKind::BelongsTo, key);
        self.remove_edges(EdgeKind::HasRoot, key);
        true
    }

    /// Apply one word's whole write unit.
    pub fn merge_word(&mut self, unit: &WordMerge) -> Result<(), StoreError> {
        let word = &unit.word;
        let properties = word_properties(word)?;
        let grade = Grade { tier: word.grade };
        self.merge_node(NodeLabel::Grade, &grade.key(), grade_properties(grade));
        if let Some(root) = &word.root {
            self.merge_node(NodeLabel::Root, root, root_properties(root));
        }
        self.merge_node(NodeLabel::Word, &word.key, properties);
        self.merge_edge(EdgeKind::BelongsTo, &word.key, &grade.key())?;
        match &word.root {
            Some(root) => self.merge_edge(EdgeKind::HasRoot, &word.key, root)?,
            None => {
                self.remove_edges(EdgeKind::HasRoot, &word.key);
            }
        }
        Ok(())
    }
}

fn missing(label: NodeLabel, key: &str) -> StoreError {
    StoreError::MissingNode {
        label: label.to_string(),
        key: key.to_string(),
    }
}

/// Lock access that recovers from poisoning.
pub(crate) fn read(lock: &RwLock<GraphData>) -> RwLockReadGuard<'_, GraphData> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(lock: &RwLock<GraphData>) -> RwLockWriteGuard<'_, GraphData> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A graph held entirely in memory. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    data: RwLock<GraphData>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of word nodes.
    pub fn word_count(&self) -> usize {
        read(&self.data).words.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    fn name(&self) -> &str {
        "memory"
    }

    async fn merge_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError> {
        write(&self.data).merge_node(label, key, properties);
        Ok(())
    }

    async fn merge_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
        _properties: PropertyMap,
    ) -> Result<(), StoreError> {
        write(&self.data).merge_edge(kind, from_key, to_key)
    }

    async fn remove_edges(&self, kind: EdgeKind, from_key: &str) -> Result<bool, StoreError> {
        Ok(write(&self.data).remove_edges(kind, from_key))
    }

    async fn query_words_by_grade(&self, tier: u8) -> Result<Vec<Word>, StoreError> {
        read(&self.data).words_by_grade(tier)
    }

    async fn query_family(&self, root: &str) -> Result<Vec<Word>, StoreError> {
        read(&self.data).family(root)
    }

    async fn query_roots(&self) -> Result<Vec<RootCount>, StoreError> {
        Ok(read(&self.data).root_counts())
    }

    async fn delete_word(&self, key: &str) -> Result<bool, StoreError> {
        Ok(write(&self.data).delete_word(key))
    }

    async fn merge_word(&self, unit: &WordMerge) -> Result<(), StoreError> {
        write(&self.data).merge_word(unit)
    }
}
