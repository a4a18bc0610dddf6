//! File-backed graph: the in-memory graph plus a JSON snapshot on disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use wordtower_core::error::StoreError;
use wordtower_core::model::{EdgeKind, NodeLabel, Word};
use wordtower_core::traits::{GraphStore, PropertyMap, RootCount, WordMerge};

use crate::memory::{read, write, GraphData};

/// A graph loaded from and saved to one JSON file.
///
/// Writes land in memory and mark the graph dirty; [`GraphStore::flush`]
/// replaces the snapshot atomically.
#[derive(Debug)]
pub struct FileGraph {
    path: PathBuf,
    data: RwLock<GraphData>,
    dirty: AtomicBool,
}

impl FileGraph {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                StoreError::Corrupt(format!("{}: {e}", path.display()))
            })?
        } else {
            GraphData::default()
        };
        tracing::debug!("opened graph snapshot {}", path.display());
        Ok(Self {
            path,
            data: RwLock::new(data),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&*read(&self.data))
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for FileGraph {
    fn name(&self) -> &str {
        "file"
    }

    async fn merge_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError> {
        write(&self.data).merge_node(label, key, properties);
        self.touch();
        Ok(())
    }

    async fn merge_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
        _properties: PropertyMap,
    ) -> Result<(), StoreError> {
        write(&self.data).merge_edge(kind, from_key, to_key)?;
        self.touch();
        Ok(())
    }

    async fn remove_edges(&self, kind: EdgeKind, from_key: &str) -> Result<bool, StoreError> {
        let removed = write(&self.data).remove_edges(kind, from_key);
        if removed {
            self.touch();
        }
        Ok(removed)
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
        let deleted = write(&self.data).delete_word(key);
        if deleted {
            self.touch();
        }
        Ok(deleted)
    }

    async fn merge_word(&self, unit: &WordMerge) -> Result<(), StoreError> {
        write(&self.data).merge_word(unit)?;
        self.touch();
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            self.touch();
            return Err(e);
        }
        tracing::info!("saved graph snapshot to {}", self.path.display());
        Ok(())
    }
}
