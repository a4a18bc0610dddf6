//! Graph builder: raw word records in, de-duplicated graph changeset out.
//!
//! The builder is pure. It never talks to a store; [`crate::importer`]
//! applies its output.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{RejectReason, ValidationError};
use crate::model::{normalize_key, normalize_root, Grade, Root, Word, WordRecord};
use crate::traits::WordMerge;

/// Configuration for the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Highest valid grade tier.
    #[serde(default = "default_grade_count")]
    pub grade_count: u8,
}

fn default_grade_count() -> u8 {
    9
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            grade_count: default_grade_count(),
        }
    }
}

/// A non-fatal observation made while merging duplicate records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// The same word appeared with different grades; the last one won.
    GradeConflict { key: String, previous: u8, kept: u8 },
    /// The same word appeared with different glosses; the last one won.
    GlossConflict {
        key: String,
        previous: String,
        kept: String,
    },
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildWarning::GradeConflict {
                key,
                previous,
                kept,
            } => write!(f, "'{key}': grade {previous} overridden by {kept}"),
            BuildWarning::GlossConflict {
                key,
                previous,
                kept,
            } => write!(f, "'{key}': gloss {previous:?} overridden by {kept:?}"),
        }
    }
}

/// Words sharing one root. Any two members are `SAME_ROOT`-related.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub root: String,
    /// Member word keys, sorted.
    pub members: Vec<String>,
}

impl Family {
    /// Every unordered member pair, each yielded once as `(a, b)` with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.members.iter().enumerate().flat_map(move |(i, a)| {
            self.members[i + 1..]
                .iter()
                .map(move |b| (a.as_str(), b.as_str()))
        })
    }

    pub fn pair_count(&self) -> usize {
        let n = self.members.len();
        n * n.saturating_sub(1) / 2
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.binary_search_by(|m| m.as_str().cmp(key)).is_ok()
    }
}

/// The nodes and edges a build wants merged into the store.
///
/// `SAME_ROOT` is carried by `families` rather than as explicit pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphChangeset {
    /// One write unit per unique word, in order of first appearance.
    pub words: Vec<WordMerge>,
    pub grades: Vec<Grade>,
    pub roots: Vec<Root>,
    /// Roots with at least two members.
    pub families: Vec<Family>,
}

impl GraphChangeset {
    /// Word, grade, and root nodes.
    pub fn node_count(&self) -> usize {
        self.words.len() + self.grades.len() + self.roots.len()
    }

    /// `BELONGS_TO` plus `HAS_ROOT` edges; derived `SAME_ROOT` pairs excluded.
    pub fn edge_count(&self) -> usize {
        self.words.len()
            + self
                .words
                .iter()
                .filter(|w| w.word.root.is_some())
                .count()
    }

    /// All `SAME_ROOT` pairs across every family.
    pub fn same_root_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.families.iter().flat_map(Family::pairs)
    }

    /// Whether `a` and `b` share a root family.
    pub fn same_root(&self, a: &str, b: &str) -> bool {
        let (a, b) = (normalize_key(a), normalize_key(b));
        a != b
            && self
                .families
                .iter()
                .any(|f| f.contains(&a) && f.contains(&b))
    }

    pub fn word(&self, key: &str) -> Option<&Word> {
        let key = normalize_key(key);
        self.words.iter().map(|w| &w.word).find(|w| w.key == key)
    }
}

/// Result of one build run.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub changeset: GraphChangeset,
    /// Records skipped as malformed.
    pub rejected: Vec<ValidationError>,
    pub warnings: Vec<BuildWarning>,
}

/// Turns word records into a graph changeset.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: BuilderConfig,
}

impl GraphBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a changeset from `records`. Malformed records are reported in
    /// `rejected`; duplicates merge with the last record winning.
    pub fn build<'a, I>(&self, records: I) -> BuildOutput
    where
        I: IntoIterator<Item = &'a WordRecord>,
    {
        let mut rejected = Vec::new();
        let mut warnings = Vec::new();
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, Word> = HashMap::new();

        for (index, record) in records.into_iter().enumerate() {
            let word = match self.validate(index, record) {
                Ok(word) => word,
                Err(e) => {
                    tracing::debug!("rejected {e}");
                    rejected.push(e);
                    continue;
                }
            };

            match merged.get(&word.key) {
                Some(previous) => {
                    if previous.grade != word.grade {
                        tracing::warn!(
                            "grade conflict for '{}': {} -> {}",
                            word.key,
                            previous.grade,
                            word.grade
                        );
                        warnings.push(BuildWarning::GradeConflict {
                            key: word.key.clone(),
                            previous: previous.grade,
                            kept: word.grade,
                        });
                    }
                    if previous.gloss != word.gloss {
                        warnings.push(BuildWarning::GlossConflict {
                            key: word.key.clone(),
                            previous: previous.gloss.clone(),
                            kept: word.gloss.clone(),
                        });
                    }
                }
                None => order.push(word.key.clone()),
            }
            merged.insert(word.key.clone(), word);
        }

        let words: Vec<Word> = order
            .iter()
            .filter_map(|key| merged.remove(key))
            .collect();

        let mut grades: Vec<Grade> = words.iter().map(|w| Grade { tier: w.grade }).collect();
        grades.sort();
        grades.dedup();

        let mut by_root: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for word in &words {
            if let Some(root) = &word.root {
                by_root
                    .entry(root.as_str())
                    .or_default()
                    .push(word.key.clone());
            }
        }

        let roots = by_root
            .keys()
            .map(|tag| Root {
                tag: tag.to_string(),
            })
            .collect();

        let families = by_root
            .iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(root, members)| {
                let mut members = members.clone();
                members.sort();
                Family {
                    root: root.to_string(),
                    members,
                }
            })
            .collect();

        let changeset = GraphChangeset {
            words: words.into_iter().map(|word| WordMerge { word }).collect(),
            grades,
            roots,
            families,
        };

        tracing::info!(
            "built {} words, {} grades, {} roots, {} families ({} rejected)",
            changeset.words.len(),
            changeset.grades.len(),
            changeset.roots.len(),
            changeset.families.len(),
            rejected.len()
        );

        BuildOutput {
            changeset,
            rejected,
            warnings,
        }
    }

    fn validate(&self, index: usize, record: &WordRecord) -> Result<Word, ValidationError> {
        let reject = |reason| ValidationError {
            index,
            text: record.text.clone(),
            reason,
        };

        let key = normalize_key(&record.text);
        if key.is_empty() {
            return Err(reject(RejectReason::EmptyText));
        }
        let max = self.config.grade_count;
        if record.grade < 1 || record.grade > i64::from(max) {
            return Err(reject(RejectReason::GradeOutOfRange {
                grade: record.grade,
                max,
            }));
        }
        let gloss = record.gloss.trim();
        if gloss.is_empty() {
            return Err(reject(RejectReason::EmptyGloss));
        }

        let text = record.text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(Word {
            key,
            is_phrase: text.contains(' '),
            text,
            gloss: gloss.to_string(),
            grade: record.grade as u8,
            root: record.root.as_deref().and_then(normalize_root),
            phonetic: non_blank(record.phonetic.as_deref()),
            pos: non_blank(record.pos.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(text: &str, grade: i64, gloss: &str, root: Option<&str>) -> WordRecord {
        WordRecord::new(text, grade, gloss, root)
    }

    fn build(records: &[WordRecord]) -> BuildOutput {
        GraphBuilder::default().build(records)
    }

    #[test]
    fn reference_example() {
        let out = build(&[
            rec("cat", 1, "猫", None),
            rec("dog", 1, "狗", Some("can")),
            rec("candle", 3, "蜡烛", Some("can")),
        ]);
        let cs = &out.changeset;
        assert!(out.rejected.is_empty());
        assert_eq!(cs.words.len(), 3);
        assert_eq!(cs.word("cat").unwrap().grade, 1);
        assert_eq!(cs.word("cat").unwrap().root, None);
        assert_eq!(cs.word("dog").unwrap().root.as_deref(), Some("can"));
        assert_eq!(cs.word("candle").unwrap().grade, 3);
        assert_eq!(cs.grades, vec![Grade { tier: 1 }, Grade { tier: 3 }]);
        assert!(cs.same_root("dog", "candle"));
        assert!(cs.same_root("candle", "dog"));
        assert!(!cs.same_root("cat", "dog"));
        assert_eq!(cs.same_root_pairs().collect::<Vec<_>>(), vec![("candle", "dog")]);
        assert_eq!(cs.edge_count(), 5);
        assert_eq!(cs.node_count(), 3 + 2 + 1);
    }

    #[test]
    fn duplicates_merge_last_write_wins() {
        let out = build(&[
            rec("Port", 2, "港口", Some("port")),
            rec("cat", 1, "猫", None),
            rec("  port ", 4, "端口", Some("port")),
        ]);
        let cs = &out.changeset;
        assert_eq!(cs.words.len(), 2);
        assert_eq!(cs.words[0].word.key, "port");
        let port = cs.word("PORT").unwrap();
        assert_eq!(port.grade, 4);
        assert_eq!(port.gloss, "端口");
        assert_eq!(port.text, "port");
        assert!(out.warnings.contains(&BuildWarning::GradeConflict {
            key: "port".into(),
            previous: 2,
            kept: 4
        }));
        assert!(out
            .warnings
            .iter()
            .any(|w| matches!(w, BuildWarning::GlossConflict { .. })));
        // Grade 2 no longer has any word.
        assert_eq!(cs.grades, vec![Grade { tier: 1 }, Grade { tier: 4 }]);
    }

    #[test]
    fn malformed_records_are_reported_not_fatal() {
        let out = build(&[
            rec("", 1, "空", None),
            rec("ok", 1, "好", None),
            rec("big", 10, "大", None),
            rec("zero", 0, "零", None),
            rec("blank", 2, "   ", None),
        ]);
        assert_eq!(out.changeset.words.len(), 1);
        let reasons: Vec<_> = out.rejected.iter().map(|e| (e.index, e.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (0, RejectReason::EmptyText),
                (2, RejectReason::GradeOutOfRange { grade: 10, max: 9 }),
                (3, RejectReason::GradeOutOfRange { grade: 0, max: 9 }),
                (4, RejectReason::EmptyGloss),
            ]
        );
    }

    #[test]
    fn single_member_root_has_no_family() {
        let out = build(&[
            rec("act", 1, "行动", Some("act")),
            rec("port", 1, "港口", Some("port")),
            rec("export", 2, "出口", Some("port")),
        ]);
        let cs = &out.changeset;
        assert_eq!(cs.roots.len(), 2);
        assert_eq!(cs.families.len(), 1);
        assert_eq!(cs.families[0].root, "port");
        assert!(!cs.same_root_pairs().any(|(a, b)| a == "act" || b == "act"));
    }

    #[test]
    fn family_pairs_are_complete_and_never_reflexive() {
        let family = Family {
            root: "port".into(),
            members: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        let pairs: Vec<_> = family.pairs().collect();
        assert_eq!(pairs.len(), family.pair_count());
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(a, b)| a < b));
    }

    #[test]
    fn build_is_idempotent() {
        let records = vec![
            rec("dog", 1, "狗", Some("can")),
            rec("candle", 3, "蜡烛", Some("can")),
            rec("dog", 1, "狗", Some("can")),
        ];
        let first = build(&records).changeset;
        let second = build(&records).changeset;
        assert_eq!(first, second);
    }

    #[test]
    fn phrases_and_optional_fields_are_normalized() {
        let mut record = rec(" look   after ", 2, " 照顾 ", Some("VIS/vid"));
        record.phonetic = Some("  ".into());
        record.pos = Some("v.".into());
        let out = build(&[record]);
        let word = out.changeset.word("Look After").unwrap();
        assert!(word.is_phrase);
        assert_eq!(word.text, "look after");
        assert_eq!(word.gloss, "照顾");
        assert_eq!(word.root.as_deref(), Some("vis"));
        assert_eq!(word.phonetic, None);
        assert_eq!(word.pos.as_deref(), Some("v."));
    }

    #[test]
    fn custom_grade_count_limits_tiers() {
        let builder = GraphBuilder::new(BuilderConfig { grade_count: 5 });
        let out = builder.build(&[rec("x", 6, "叉", None)]);
        assert_eq!(
            out.rejected[0].reason,
            RejectReason::GradeOutOfRange { grade: 6, max: 5 }
        );
    }
}
