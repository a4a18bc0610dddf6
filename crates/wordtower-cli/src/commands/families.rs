//! The `wordtower families` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordtower_core::model::normalize_root;
use wordtower_store::open_store;

use super::GlobalOpts;

pub async fn execute(opts: &GlobalOpts, root: Option<String>) -> Result<()> {
    let config = opts.settings()?;
    let store = open_store(&config.store)?;

    match root {
        Some(tag) => {
            let tag = normalize_root(&tag)
                .ok_or_else(|| anyhow::anyhow!("root tag must not be empty"))?;
            let members = store.query_family(&tag).await?;
            if members.is_empty() {
                println!("No words with root '{tag}'.");
                return Ok(());
            }

            println!("Family '{tag}' ({} words):", members.len());
            let mut table = Table::new();
            table.set_header(vec!["Word", "Grade", "Gloss"]);
            for word in &members {
                table.add_row(vec![
                    Cell::new(&word.text),
                    Cell::new(word.grade),
                    Cell::new(&word.gloss),
                ]);
            }
            println!("{table}");
        }
        None => {
            let families: Vec<_> = store
                .query_roots()
                .await?
                .into_iter()
                .filter(|r| r.members >= 2)
                .collect();
            if families.is_empty() {
                println!("No root families yet.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["Root", "Words"]);
            for family in &families {
                table.add_row(vec![Cell::new(&family.root), Cell::new(family.members)]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
