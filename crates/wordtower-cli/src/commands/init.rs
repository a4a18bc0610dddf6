//! The `wordtower init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("wordtower.toml").exists() {
        println!("wordtower.toml already exists, skipping.");
    } else {
        std::fs::write("wordtower.toml", SAMPLE_CONFIG)?;
        println!("Created wordtower.toml");
    }

    std::fs::create_dir_all("words")?;
    let sample_path = Path::new("words/sample.toml");
    if sample_path.exists() {
        println!("words/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_WORDS)?;
        println!("Created words/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: wordtower validate --words words");
    println!("  2. Run: wordtower import --words words");
    println!("  3. Run: wordtower play --floor 1");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# wordtower configuration

mistakes_path = "wordtower-mistakes.json"

[store]
type = "file"
path = "wordtower-graph.json"

[builder]
grade_count = 9

[quiz]
questions_per_floor = 10
options_per_question = 4
include_phrases = false
# seed = 42
"#;

const SAMPLE_WORDS: &str = r#"[word_list]
name = "Sample"
description = "A few words to get started"

[[words]]
text = "cat"
grade = 1
gloss = "猫"
pos = "n."

[[words]]
text = "dog"
grade = 1
gloss = "狗"
pos = "n."

[[words]]
text = "apple"
grade = 1
gloss = "苹果"
pos = "n."

[[words]]
text = "book"
grade = 1
gloss = "书"
pos = "n."

[[words]]
text = "look after"
grade = 1
gloss = "照顾"
pos = "phr."

[[words]]
text = "port"
grade = 2
gloss = "港口"
root = "port"
pos = "n."

[[words]]
text = "export"
grade = 2
gloss = "出口"
root = "port"
pos = "v."

[[words]]
text = "import"
grade = 2
gloss = "进口"
root = "port"
pos = "v."

[[words]]
text = "transport"
grade = 3
gloss = "运输"
root = "port"
pos = "v."

[[words]]
text = "visit"
grade = 3
gloss = "参观"
root = "vis/vid"
pos = "v."

[[words]]
text = "video"
grade = 3
gloss = "视频"
root = "vis/vid"
pos = "n."
"#;
