//! Test fixtures: a sample vocabulary and a minimal in-process store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{EdgeKind, NodeLabel, Word, WordRecord};
use crate::traits::{word_from_properties, GraphStore, PropertyMap, RootCount};

/// Grade 1: twelve animals plus one phrase. Grade 2: a three-word `port`
/// family. Grade 3: `candle`, sharing `can` with `dog`. Grade 5: two words
/// with the same gloss.
pub fn records() -> Vec<WordRecord> {
    let mut records: Vec<WordRecord> = [
        ("cat", "猫", None),
        ("dog", "狗", Some("can")),
        ("pig", "猪", None),
        ("cow", "牛", None),
        ("hen", "母鸡", None),
        ("fox", "狐狸", None),
        ("owl", "猫头鹰", None),
        ("bee", "蜜蜂", None),
        ("ant", "蚂蚁", None),
        ("rat", "老鼠", None),
        ("yak", "牦牛", None),
        ("elk", "麋鹿", None),
        ("look after", "照顾", None),
    ]
    .into_iter()
    .map(|(text, gloss, root)| WordRecord::new(text, 1, gloss, root))
    .collect();

    records.extend([
        WordRecord::new("port", 2, "港口", Some("port")),
        WordRecord::new("export", 2, "出口", Some("port")),
        WordRecord::new("import", 2, "进口", Some("port")),
        WordRecord::new("candle", 3, "蜡烛", Some("can")),
        WordRecord::new("big", 5, "大", None),
        WordRecord::new("large", 5, "大", None),
    ]);
    records
}

#[derive(Default)]
struct Inner {
    words: BTreeMap<String, Word>,
    grades: BTreeSet<String>,
    roots: BTreeSet<String>,
    unavailable: bool,
    flushes: usize,
}

/// Store backed by plain collections, with failure injection.
#[derive(Default)]
pub struct VecStore {
    inner: Mutex<Inner>,
}

impl VecStore {
    /// Make every subsequent write and grade query fail as unavailable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    pub fn flushes(&self) -> usize {
        self.inner.lock().unwrap().flushes
    }

    pub fn snapshot(&self) -> Vec<Word> {
        self.inner.lock().unwrap().words.values().cloned().collect()
    }
}

#[async_trait]
impl GraphStore for VecStore {
    fn name(&self) -> &str {
        "vec"
    }

    async fn merge_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(StoreError::Unavailable("store offline".into()));
        }
        match label {
            NodeLabel::Word => {
                let word = word_from_properties(&properties)?;
                inner.words.insert(key.to_string(), word);
            }
            NodeLabel::Grade => {
                inner.grades.insert(key.to_string());
            }
            NodeLabel::Root => {
                inner.roots.insert(key.to_string());
            }
        }
        Ok(())
    }

    async fn merge_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
        _properties: PropertyMap,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let exists = match kind {
            EdgeKind::BelongsTo => inner.grades.contains(to_key),
            EdgeKind::HasRoot => inner.roots.contains(to_key),
            EdgeKind::SameRoot => inner.words.contains_key(to_key),
        };
        if !exists {
            return Err(StoreError::MissingNode {
                label: kind.to_string(),
                key: to_key.to_string(),
            });
        }
        let word = inner
            .words
            .get_mut(from_key)
            .ok_or_else(|| StoreError::MissingNode {
                label: "Word".into(),
                key: from_key.to_string(),
            })?;
        match kind {
            EdgeKind::BelongsTo => {
                word.grade = to_key
                    .parse()
                    .map_err(|_| StoreError::Corrupt(format!("bad grade key {to_key}")))?
            }
            EdgeKind::HasRoot => word.root = Some(to_key.to_string()),
            EdgeKind::SameRoot => {}
        }
        Ok(())
    }

    async fn remove_edges(&self, kind: EdgeKind, from_key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match (kind, inner.words.get_mut(from_key)) {
            (EdgeKind::HasRoot, Some(word)) => Ok(word.root.take().is_some()),
            _ => Ok(false),
        }
    }

    async fn query_words_by_grade(&self, tier: u8) -> Result<Vec<Word>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(StoreError::Unavailable("store offline".into()));
        }
        Ok(inner
            .words
            .values()
            .filter(|w| w.grade == tier)
            .cloned()
            .collect())
    }

    async fn query_family(&self, root: &str) -> Result<Vec<Word>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .words
            .values()
            .filter(|w| w.root.as_deref() == Some(root))
            .cloned()
            .collect())
    }

    async fn query_roots(&self) -> Result<Vec<RootCount>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for root in inner.words.values().filter_map(|w| w.root.clone()) {
            *counts.entry(root).or_default() += 1;
        }
        let mut roots: Vec<RootCount> = counts
            .into_iter()
            .map(|(root, members)| RootCount { root, members })
            .collect();
        roots.sort_by(|a, b| b.members.cmp(&a.members));
        Ok(roots)
    }

    async fn delete_word(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().words.remove(key).is_some())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.inner.lock().unwrap().flushes += 1;
        Ok(())
    }
}
