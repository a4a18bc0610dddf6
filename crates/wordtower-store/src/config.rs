//! Configuration loading and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wordtower_core::builder::BuilderConfig;
use wordtower_core::engine::QuizConfig;
use wordtower_core::traits::GraphStore;

use crate::file::FileGraph;
use crate::memory::MemoryGraph;

/// Which graph store to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Nothing persists past the process.
    Memory,
    /// JSON snapshot at `path`.
    File {
        #[serde(default = "default_graph_path")]
        path: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_graph_path(),
        }
    }
}

fn default_graph_path() -> String {
    "wordtower-graph.json".to_string()
}

fn default_mistakes_path() -> String {
    "wordtower-mistakes.json".to_string()
}

/// Top-level wordtower configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerConfig {
    /// Mistake log location.
    #[serde(default = "default_mistakes_path")]
    pub mistakes_path: String,
    #[serde(default)]
    pub store: StoreConfig,
    /// `grade_count` here also bounds the quiz floors.
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            mistakes_path: default_mistakes_path(),
            store: StoreConfig::default(),
            builder: BuilderConfig::default(),
            quiz: QuizConfig::default(),
        }
    }
}

impl TowerConfig {
    pub fn mistakes_path(&self) -> PathBuf {
        PathBuf::from(&self.mistakes_path)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to nothing.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `wordtower.toml` in the current directory
/// 2. `~/.config/wordtower/config.toml`
///
/// `WORDTOWER_GRAPH` overrides the store with a file store at that path.
pub fn load_config() -> Result<TowerConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TowerConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("wordtower.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<TowerConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TowerConfig::default(),
    };

    if let Ok(graph) = std::env::var("WORDTOWER_GRAPH") {
        config.store = StoreConfig::File { path: graph };
    }

    config.mistakes_path = resolve_env_vars(&config.mistakes_path);
    if let StoreConfig::File { path } = &mut config.store {
        *path = resolve_env_vars(path);
    }
    config.quiz.grade_count = config.builder.grade_count;
    config.quiz.validate()?;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("wordtower"))
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn GraphStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryGraph::new())),
        StoreConfig::File { path } => {
            let graph = FileGraph::open(path)
                .with_context(|| format!("failed to open graph store: {path}"))?;
            Ok(Arc::new(graph))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_WORDTOWER_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_WORDTOWER_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_WORDTOWER_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_WORDTOWER_UNSET_VAR}/x"), "/x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_WORDTOWER_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = TowerConfig::default();
        assert_eq!(config.quiz.questions_per_floor, 10);
        assert_eq!(config.quiz.options_per_question, 4);
        assert_eq!(config.builder.grade_count, 9);
        assert!(!config.quiz.include_phrases);
        assert!(matches!(config.store, StoreConfig::File { .. }));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
mistakes_path = "m.json"

[store]
type = "file"
path = "g.json"

[builder]
grade_count = 6

[quiz]
questions_per_floor = 5
include_phrases = true
seed = 42
"#;
        let config: TowerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                path: "g.json".into()
            }
        );
        assert_eq!(config.builder.grade_count, 6);
        assert_eq!(config.quiz.questions_per_floor, 5);
        assert_eq!(config.quiz.options_per_question, 4);
        assert_eq!(config.quiz.seed, Some(42));
        assert_eq!(config.mistakes_path, "m.json");
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordtower.toml");
        std::fs::write(
            &path,
            "[store]\ntype = \"memory\"\n\n[builder]\ngrade_count = 3\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.quiz.grade_count, 3);
    }

    #[test]
    fn unplayable_quiz_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (quiz, message) in [
            ("questions_per_floor = 0", "questions_per_floor must be at least 1"),
            ("options_per_question = 1", "options_per_question must be at least 2"),
        ] {
            let path = dir.path().join("wordtower.toml");
            std::fs::write(&path, format!("[store]\ntype = \"memory\"\n\n[quiz]\n{quiz}\n")).unwrap();
            let err = load_config_from(Some(&path)).unwrap_err();
            assert!(format!("{err:#}").contains(message), "{err:#}");
        }
    }

    #[test]
    fn quiz_mode_from_config() {
        let config: TowerConfig = toml::from_str("[quiz]\nmode = \"spell\"\n").unwrap();
        assert_eq!(config.quiz.mode, wordtower_core::engine::QuizMode::Spell);
        assert_eq!(config.quiz.spelling_attempts, 3);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/wordtower.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn open_memory_and_file_stores() {
        let memory = open_store(&StoreConfig::Memory).unwrap();
        assert_eq!(memory.name(), "memory");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.json").to_string_lossy().into_owned();
        let file = open_store(&StoreConfig::File { path }).unwrap();
        assert_eq!(file.name(), "file");
    }
}
