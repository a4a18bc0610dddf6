//! Subcommand implementations.

pub mod families;
pub mod import;
pub mod init;
pub mod play;
pub mod remove;
pub mod review;
pub mod stats;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;

use wordtower_core::builder::{BuildOutput, GraphBuilder};
use wordtower_core::model::WordRecord;
use wordtower_core::source::{load_words, WordList};
use wordtower_store::{load_config_from, StoreConfig, TowerConfig};

/// Options every subcommand accepts.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub graph: Option<PathBuf>,
}

impl GlobalOpts {
    /// Load the configuration, letting `--graph` override the store.
    pub fn settings(&self) -> Result<TowerConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(graph) = &self.graph {
            config.store = StoreConfig::File {
                path: graph.to_string_lossy().into_owned(),
            };
        }
        tracing::debug!("store: {:?}", config.store);
        Ok(config)
    }
}

/// Parse word lists at `path` and build them in one pass, printing a
/// line per list, every rejected record, and every warning.
pub(crate) fn build_words(path: &Path, config: &TowerConfig) -> Result<BuildOutput> {
    let lists = load_words(path)?;
    anyhow::ensure!(!lists.is_empty(), "no word lists found in {}", path.display());

    for list in &lists {
        println!("Word list: {} ({} records)", list.name, list.records.len());
    }

    let builder = GraphBuilder::new(config.builder.clone());
    let out = builder.build(all_records(&lists));

    for rejected in &out.rejected {
        println!("  REJECTED: {rejected}");
    }
    for warning in &out.warnings {
        println!("  WARNING: {warning}");
    }
    Ok(out)
}

fn all_records(lists: &[WordList]) -> impl Iterator<Item = &WordRecord> {
    lists.iter().flat_map(|list| &list.records)
}
