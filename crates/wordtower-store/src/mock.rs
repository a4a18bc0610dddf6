//! Mock store for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use wordtower_core::error::StoreError;
use wordtower_core::model::{EdgeKind, NodeLabel, Word};
use wordtower_core::traits::{GraphStore, PropertyMap, RootCount};

use crate::memory::MemoryGraph;

/// A store for exercising callers against outages.
///
/// Delegates to a [`MemoryGraph`], counts every call, and once
/// `fail_after` calls have succeeded answers everything with
/// [`StoreError::Unavailable`]. `merge_word` is not overridden, so each
/// word costs one call per node and edge merge.
#[derive(Debug, Default)]
pub struct MockStore {
    inner: MemoryGraph,
    /// Number of calls allowed before failing.
    fail_after: Option<u32>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Name of the last operation called.
    last_call: Mutex<Option<&'static str>>,
}

impl MockStore {
    /// A mock that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails every call after the first `calls`.
    pub fn failing_after(calls: u32) -> Self {
        Self {
            fail_after: Some(calls),
            ..Self::default()
        }
    }

    /// Get the number of calls made to this store.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last operation called on this store.
    pub fn last_call(&self) -> Option<&'static str> {
        *self.last_call.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The wrapped graph, for inspecting what got through.
    pub fn inner(&self) -> &MemoryGraph {
        &self.inner
    }

    fn call(&self, op: &'static str) -> Result<(), StoreError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_call.lock().unwrap_or_else(PoisonError::into_inner) = Some(op);
        match self.fail_after {
            Some(limit) if n > limit => Err(StoreError::Unavailable(format!(
                "mock store down after {limit} calls ({op})"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl GraphStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn merge_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError> {
        self.call("merge_node")?;
        self.inner.merge_node(label, key, properties).await
    }

    async fn merge_edge(
        &self,
        kind: EdgeKind,
        from_key: &str,
        to_key: &str,
        properties: PropertyMap,
    ) -> Result<(), StoreError> {
        self.call("merge_edge")?;
        self.inner.merge_edge(kind, from_key, to_key, properties).await
    }

    async fn remove_edges(&self, kind: EdgeKind, from_key: &str) -> Result<bool, StoreError> {
        self.call("remove_edges")?;
        self.inner.remove_edges(kind, from_key).await
    }

    async fn query_words_by_grade(&self, tier: u8) -> Result<Vec<Word>, StoreError> {
        self.call("query_words_by_grade")?;
        self.inner.query_words_by_grade(tier).await
    }

    async fn query_family(&self, root: &str) -> Result<Vec<Word>, StoreError> {
        self.call("query_family")?;
        self.inner.query_family(root).await
    }

    async fn query_roots(&self) -> Result<Vec<RootCount>, StoreError> {
        self.call("query_roots")?;
        self.inner.query_roots().await
    }

    async fn delete_word(&self, key: &str) -> Result<bool, StoreError> {
        self.call("delete_word")?;
        self.inner.delete_word(key).await
    }
}
