//! The `wordtower remove` command.

use std::path::PathBuf;

use anyhow::Result;

use wordtower_core::mistakes::MistakeLog;
use wordtower_core::model::normalize_key;
use wordtower_core::traits::purge_word;
use wordtower_store::open_store;

use super::GlobalOpts;

pub async fn execute(opts: &GlobalOpts, word: String, mistakes: Option<PathBuf>) -> Result<()> {
    let config = opts.settings()?;
    let path = mistakes.unwrap_or_else(|| config.mistakes_path());
    let store = open_store(&config.store)?;
    let mut book = MistakeLog::load_json(&path)?;

    let key = normalize_key(&word);
    if purge_word(store.as_ref(), &mut book, &key).await? {
        store.flush().await?;
        book.save_json(&path)?;
        println!("Removed '{word}'.");
    } else {
        println!("'{word}' is not in the graph.");
    }

    Ok(())
}
