//! The `wordtower validate` command.

use std::path::PathBuf;

use anyhow::Result;

use wordtower_core::statistics::GraphStats;

use super::{build_words, GlobalOpts};

pub fn execute(opts: &GlobalOpts, words: PathBuf) -> Result<()> {
    let config = opts.settings()?;
    let out = build_words(&words, &config)?;
    let stats = GraphStats::from_changeset(&out.changeset);

    println!(
        "{} words, {} grades, {} roots, {} families",
        stats.words,
        out.changeset.grades.len(),
        stats.roots,
        stats.families
    );

    if out.rejected.is_empty() && out.warnings.is_empty() {
        println!("All word lists valid.");
    } else {
        println!(
            "\n{} rejected record(s), {} warning(s) found.",
            out.rejected.len(),
            out.warnings.len()
        );
    }

    Ok(())
}
