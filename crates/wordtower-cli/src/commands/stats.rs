//! The `wordtower stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordtower_core::statistics::collect_store_stats;
use wordtower_store::open_store;

use super::GlobalOpts;

pub async fn execute(opts: &GlobalOpts) -> Result<()> {
    let config = opts.settings()?;
    let store = open_store(&config.store)?;
    let stats = collect_store_stats(store.as_ref(), config.builder.grade_count).await?;

    if stats.words == 0 {
        println!("The graph is empty. Run `wordtower import --words <path>` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Grade", "Words"]);
    for (tier, count) in &stats.per_grade {
        table.add_row(vec![Cell::new(tier), Cell::new(count)]);
    }
    println!("{table}");

    println!("Words: {} ({} phrases)", stats.words, stats.phrases);
    println!(
        "Roots: {} ({:.0}% of words have one)",
        stats.roots,
        stats.root_coverage() * 100.0
    );
    println!(
        "Families: {} ({} same-root pairs, largest has {} words)",
        stats.families, stats.same_root_pairs, stats.largest_family
    );

    Ok(())
}
