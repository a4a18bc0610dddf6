//! Graph statistics, computed either from a changeset or from a live store.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::builder::GraphChangeset;
use crate::error::StoreError;
use crate::traits::GraphStore;

/// Shape of a vocabulary graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub words: usize,
    /// Words whose display text has more than one token.
    pub phrases: usize,
    /// Words per grade tier; empty tiers are omitted.
    pub per_grade: BTreeMap<u8, usize>,
    pub roots: usize,
    /// Words linked to some root.
    pub words_with_root: usize,
    /// Roots with at least two members.
    pub families: usize,
    /// Derived `SAME_ROOT` pairs.
    pub same_root_pairs: usize,
    /// Member count of the largest family.
    pub largest_family: usize,
}

impl GraphStats {
    /// Statistics of what `changeset` would write.
    pub fn from_changeset(changeset: &GraphChangeset) -> Self {
        let mut stats = GraphStats {
            roots: changeset.roots.len(),
            families: changeset.families.len(),
            ..GraphStats::default()
        };
        for unit in &changeset.words {
            let word = &unit.word;
            stats.words += 1;
            if word.is_phrase {
                stats.phrases += 1;
            }
            if word.root.is_some() {
                stats.words_with_root += 1;
            }
            *stats.per_grade.entry(word.grade).or_default() += 1;
        }
        for family in &changeset.families {
            stats.same_root_pairs += family.pair_count();
            stats.largest_family = stats.largest_family.max(family.members.len());
        }
        stats
    }

    /// Fraction of words linked to a root.
    pub fn root_coverage(&self) -> f64 {
        if self.words == 0 {
            0.0
        } else {
            self.words_with_root as f64 / self.words as f64
        }
    }
}

/// Collect statistics by querying `store` for every tier in `1..=grade_count`.
///
/// Words graded above `grade_count` are not seen.
pub async fn collect_store_stats(
    store: &dyn GraphStore,
    grade_count: u8,
) -> Result<GraphStats, StoreError> {
    let grades = try_join_all((1..=grade_count).map(|tier| store.query_words_by_grade(tier))).await?;
    let roots = store.query_roots().await?;

    let mut stats = GraphStats {
        roots: roots.len(),
        ..GraphStats::default()
    };
    for (tier, words) in (1..=grade_count).zip(&grades) {
        if words.is_empty() {
            continue;
        }
        stats.per_grade.insert(tier, words.len());
        stats.words += words.len();
        stats.phrases += words.iter().filter(|w| w.is_phrase).count();
        stats.words_with_root += words.iter().filter(|w| w.root.is_some()).count();
    }
    for root in roots.iter().filter(|r| r.members >= 2) {
        stats.families += 1;
        stats.same_root_pairs += root.members * (root.members - 1) / 2;
        stats.largest_family = stats.largest_family.max(root.members);
    }
    tracing::debug!("collected stats from {} store: {} words", store.name(), stats.words);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::fixtures::{records, VecStore};
    use crate::importer::apply_changeset;

    #[test]
    fn changeset_stats() {
        let out = GraphBuilder::default().build(&records());
        let stats = GraphStats::from_changeset(&out.changeset);
        assert_eq!(stats.words, 19);
        assert_eq!(stats.phrases, 1);
        assert_eq!(stats.per_grade.get(&1), Some(&13));
        assert_eq!(stats.per_grade.get(&2), Some(&3));
        assert_eq!(stats.per_grade.get(&4), None);
        assert_eq!(stats.roots, 2);
        assert_eq!(stats.words_with_root, 5);
        assert_eq!(stats.families, 2);
        // port: 3 pairs, can: 1 pair
        assert_eq!(stats.same_root_pairs, 4);
        assert_eq!(stats.largest_family, 3);
    }

    #[test]
    fn empty_changeset() {
        let stats = GraphStats::from_changeset(&GraphChangeset::default());
        assert_eq!(stats, GraphStats::default());
        assert_eq!(stats.root_coverage(), 0.0);
    }

    #[tokio::test]
    async fn store_stats_match_changeset_stats() {
        let store = VecStore::default();
        let out = GraphBuilder::default().build(&records());
        apply_changeset(&store, &out.changeset).await.unwrap();

        let from_store = collect_store_stats(&store, 9).await.unwrap();
        assert_eq!(from_store, GraphStats::from_changeset(&out.changeset));
    }

    #[tokio::test]
    async fn store_stats_propagate_outage() {
        let store = VecStore::default();
        store.set_unavailable(true);
        assert!(matches!(
            collect_store_stats(&store, 9).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
