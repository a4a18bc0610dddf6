//! Core data model types for wordtower.
//!
//! Raw `WordRecord`s come from a word-list source; the builder turns them
//! into `Word`s grouped under `Grade`s and `Root`s. Relationship kinds and
//! node labels name the property-graph schema the store adapters speak.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single vocabulary entry as read from a word-list source.
///
/// Fields are kept loose (signed grade, possibly empty strings) so that
/// malformed entries survive parsing and are rejected by the builder with
/// a proper report instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    /// The word or phrase as written.
    #[serde(default, alias = "word")]
    pub text: String,
    /// Grade tier, expected in `1..=grade_count`.
    #[serde(default)]
    pub grade: i64,
    /// Gloss (translation / definition).
    #[serde(default, alias = "definition")]
    pub gloss: String,
    /// Optional root/affix tag, e.g. `"port"` or `"vis/vid"`.
    #[serde(default)]
    pub root: Option<String>,
    /// Optional phonetic transcription.
    #[serde(default)]
    pub phonetic: Option<String>,
    /// Optional part of speech (`n.`, `v.`, `adj.` ...).
    #[serde(default)]
    pub pos: Option<String>,
}

impl WordRecord {
    pub fn new(text: &str, grade: i64, gloss: &str, root: Option<&str>) -> Self {
        Self {
            text: text.to_string(),
            grade,
            gloss: gloss.to_string(),
            root: root.map(str::to_string),
            phonetic: None,
            pos: None,
        }
    }
}

/// A de-duplicated vocabulary word, as stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Case-normalized unique key.
    pub key: String,
    /// Display form (trimmed, original casing).
    pub text: String,
    pub gloss: String,
    /// Grade tier this word belongs to.
    pub grade: u8,
    /// Normalized root tag, if any.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,
    /// Whether the display text is a multi-word phrase.
    #[serde(default)]
    pub is_phrase: bool,
}

impl Word {
    /// A lightweight reference to this word, used by the mistake book.
    pub fn to_ref(&self) -> WordRef {
        WordRef {
            key: self.key.clone(),
            text: self.text.clone(),
            gloss: self.gloss.clone(),
            grade: self.grade,
        }
    }
}

/// A reference to a word that outlives a quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordRef {
    pub key: String,
    pub text: String,
    pub gloss: String,
    pub grade: u8,
}

/// A grade tier. Derived: exists iff at least one word references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Grade {
    pub tier: u8,
}

impl Grade {
    /// Node key used for grade nodes in the store.
    pub fn key(&self) -> String {
        self.tier.to_string()
    }
}

/// A root/affix tag. Derived: exists iff at least one word references it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Root {
    pub tag: String,
}

/// Node labels of the vocabulary graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Word,
    Grade,
    Root,
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLabel::Word => write!(f, "Word"),
            NodeLabel::Grade => write!(f, "Grade"),
            NodeLabel::Root => write!(f, "Root"),
        }
    }
}

/// Relationship types of the vocabulary graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Word → Grade, exactly one per word.
    BelongsTo,
    /// Word → Root, zero or one per word.
    HasRoot,
    /// Word ↔ Word, derived from shared `HasRoot` targets.
    SameRoot,
}

impl EdgeKind {
    /// Functional edges allow at most one target per source node; merging
    /// a new target replaces the previous one.
    pub fn is_functional(&self) -> bool {
        matches!(self, EdgeKind::BelongsTo | EdgeKind::HasRoot)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::BelongsTo => write!(f, "BELONGS_TO"),
            EdgeKind::HasRoot => write!(f, "HAS_ROOT"),
            EdgeKind::SameRoot => write!(f, "SAME_ROOT"),
        }
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BELONGS_TO" => Ok(EdgeKind::BelongsTo),
            "HAS_ROOT" => Ok(EdgeKind::HasRoot),
            "SAME_ROOT" => Ok(EdgeKind::SameRoot),
            other => Err(format!("unknown edge kind: {other}")),
        }
    }
}

/// Normalize word text into its unique key: trimmed, lowercased, inner
/// whitespace collapsed to single spaces.
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a root tag. Alternate spellings written as `vis/vid` collapse
/// to their first form. Returns `None` for blank tags.
pub fn normalize_root(tag: &str) -> Option<String> {
    let first = tag.split('/').next().unwrap_or_default().trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_lowercase())
    }
}
