//! Word-list source.
//!
//! Loads `WordRecord`s from TOML and JSON files and directories. Records are
//! passed through as written; validation is the builder's job.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::WordRecord;

/// A parsed word-list file.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    /// Display name from the file header, or the file stem.
    pub name: String,
    pub description: String,
    pub records: Vec<WordRecord>,
}

/// Supported word-list encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Toml,
    Json,
}

impl ListFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "toml" => Some(ListFormat::Toml),
            "json" => Some(ListFormat::Json),
            _ => None,
        }
    }
}

/// Intermediate TOML structure for word-list files.
#[derive(Debug, Deserialize)]
struct TomlWordFile {
    #[serde(default)]
    word_list: Option<WordListHeader>,
    #[serde(default)]
    words: Vec<WordRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct WordListHeader {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

/// JSON word lists are either a bare array or an object with a header.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonWordFile {
    Bare(Vec<WordRecord>),
    Wrapped {
        #[serde(default)]
        name: String,
        #[serde(default)]
        description: String,
        words: Vec<WordRecord>,
    },
}

/// Parse a single word-list file.
pub fn parse_word_list(path: &Path) -> Result<WordList> {
    let format = ListFormat::from_path(path)
        .with_context(|| format!("unsupported word list format: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read word list: {}", path.display()))?;

    parse_word_list_str(&content, format, path)
}

/// Parse word-list content held in memory (useful for testing).
pub fn parse_word_list_str(content: &str, format: ListFormat, source_path: &Path) -> Result<WordList> {
    let fallback_name = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (name, description, records) = match format {
        ListFormat::Toml => {
            let parsed: TomlWordFile = toml::from_str(content)
                .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
            let header = parsed.word_list.unwrap_or_default();
            (header.name, header.description, parsed.words)
        }
        ListFormat::Json => {
            let parsed: JsonWordFile = serde_json::from_str(content)
                .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
            match parsed {
                JsonWordFile::Bare(words) => (String::new(), String::new(), words),
                JsonWordFile::Wrapped {
                    name,
                    description,
                    words,
                } => (name, description, words),
            }
        }
    };

    Ok(WordList {
        name: if name.is_empty() { fallback_name } else { name },
        description,
        records,
    })
}

/// Recursively load every `.toml` / `.json` word list under `dir`, in
/// path order. Files that fail to parse are skipped with a warning.
pub fn load_word_directory(dir: &Path) -> Result<Vec<WordList>> {
    let mut lists = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            lists.extend(load_word_directory(&path)?);
        } else if ListFormat::from_path(&path).is_some() {
            match parse_word_list(&path) {
                Ok(list) => lists.push(list),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(lists)
}

/// Load a single file or a whole directory of word lists.
pub fn load_words(path: &Path) -> Result<Vec<WordList>> {
    if path.is_dir() {
        load_word_directory(path)
    } else {
        Ok(vec![parse_word_list(path)?])
    }
}
