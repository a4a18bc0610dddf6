//! The `wordtower import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use wordtower_core::importer::apply_changeset;
use wordtower_store::open_store;

use super::{build_words, GlobalOpts};

pub async fn execute(opts: &GlobalOpts, words: PathBuf) -> Result<()> {
    let config = opts.settings()?;
    let out = build_words(&words, &config)?;

    let store = open_store(&config.store)?;
    let summary = apply_changeset(store.as_ref(), &out.changeset)
        .await
        .context("import failed; re-run to retry")?;

    println!(
        "Imported {} words into {} store ({} grades, {} roots, {} families, {} same-root pairs)",
        summary.words,
        summary.store,
        summary.grades,
        summary.roots,
        summary.families,
        summary.same_root_pairs
    );
    if !out.rejected.is_empty() {
        println!("{} record(s) skipped.", out.rejected.len());
    }

    Ok(())
}
