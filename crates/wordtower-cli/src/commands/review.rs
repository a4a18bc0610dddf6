//! The `wordtower review` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use wordtower_core::mistakes::MistakeLog;
use wordtower_core::model::normalize_key;
use wordtower_core::traits::{ListFilter, MistakeBook};

use super::GlobalOpts;

pub fn execute(
    opts: &GlobalOpts,
    all: bool,
    master: Option<String>,
    mistakes: Option<PathBuf>,
) -> Result<()> {
    let config = opts.settings()?;
    let path = mistakes.unwrap_or_else(|| config.mistakes_path());
    let mut book = MistakeLog::load_json(&path)?;

    if let Some(word) = master {
        let key = normalize_key(&word);
        match book.get(&key).map(|entry| entry.mastered) {
            Some(true) => println!("'{word}' is already mastered."),
            Some(false) => {
                book.mark_mastered(&key);
                book.save_json(&path)?;
                println!("Marked '{word}' as mastered.");
            }
            None => println!("'{word}' is not in the mistake book."),
        }
    }

    let filter = if all {
        ListFilter::All
    } else {
        ListFilter::Unmastered
    };
    let entries: Vec<_> = book.list(filter).collect();
    if entries.is_empty() {
        println!("No words to review.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Word", "Gloss", "Grade", "Misses", "Last missed", "Mastered"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(&entry.word.text),
            Cell::new(&entry.word.gloss),
            Cell::new(entry.word.grade),
            Cell::new(entry.attempts),
            Cell::new(entry.last_missed_at.format("%Y-%m-%d %H:%M")),
            Cell::new(if entry.mastered { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
    println!("{} word(s) to review.", book.pending().count());

    Ok(())
}
