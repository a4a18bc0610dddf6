//! Applies a builder changeset to a graph store.

use serde::{Deserialize, Serialize};

use crate::builder::GraphChangeset;
use crate::error::StoreError;
use crate::traits::GraphStore;

/// Counts from one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub store: String,
    pub words: usize,
    pub grades: usize,
    pub roots: usize,
    pub families: usize,
    pub same_root_pairs: usize,
}

/// Merge every word of `changeset` into `store`, one atomic unit per word,
/// then flush.
///
/// Store failures abort the run and propagate unchanged. Because every
/// write is a merge by key, the caller retries by re-running the import.
pub async fn apply_changeset(
    store: &dyn GraphStore,
    changeset: &GraphChangeset,
) -> Result<ImportSummary, StoreError> {
    tracing::info!(
        "importing {} words into {} store",
        changeset.words.len(),
        store.name()
    );

    for (i, unit) in changeset.words.iter().enumerate() {
        store.merge_word(unit).await.map_err(|e| {
            tracing::error!("import failed at word {} ('{}'): {e}", i, unit.word.key);
            e
        })?;
        tracing::debug!("merged '{}' ({}/{})", unit.word.key, i + 1, changeset.words.len());
    }

    store.flush().await?;

    Ok(ImportSummary {
        store: store.name().to_string(),
        words: changeset.words.len(),
        grades: changeset.grades.len(),
        roots: changeset.roots.len(),
        families: changeset.families.len(),
        same_root_pairs: changeset.families.iter().map(|f| f.pair_count()).sum(),
    })
}
