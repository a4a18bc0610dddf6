//! Cross-crate pipeline tests: word list → builder → store → quiz engine →
//! mistake book, against every store adapter.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use wordtower_core::builder::GraphBuilder;
use wordtower_core::engine::{QuizConfig, QuizEngine, SessionState};
use wordtower_core::error::{QuizError, StoreError};
use wordtower_core::importer::apply_changeset;
use wordtower_core::mistakes::MistakeLog;
use wordtower_core::model::WordRecord;
use wordtower_core::source::{parse_word_list_str, ListFormat};
use wordtower_core::traits::{purge_word, GraphStore, ListFilter, MistakeBook, NoopSink};
use wordtower_store::{FileGraph, MemoryGraph, MockStore};

const WORDS: &str = r#"
[word_list]
name = "Pipeline"

[[words]]
text = "cat"
grade = 1
gloss = "猫"

[[words]]
text = "dog"
grade = 1
gloss = "狗"
root = "can"

[[words]]
text = "Candle"
grade = 3
gloss = "蜡烛"
root = "can"

[[words]]
text = "bird"
grade = 1
gloss = "鸟"

[[words]]
text = "fish"
grade = 1
gloss = "鱼"

[[words]]
text = "give up"
grade = 1
gloss = "放弃"
"#;

fn records() -> Vec<WordRecord> {
    parse_word_list_str(WORDS, ListFormat::Toml, Path::new("pipeline.toml"))
        .unwrap()
        .records
}

fn seeded(seed: u64) -> QuizConfig {
    QuizConfig {
        seed: Some(seed),
        ..QuizConfig::default()
    }
}

async fn import_into(store: &dyn GraphStore) {
    let out = GraphBuilder::default().build(&records());
    assert!(out.rejected.is_empty());
    apply_changeset(store, &out.changeset).await.unwrap();
}

#[test]
fn builder_example_graph() {
    let out = GraphBuilder::default().build(&records());
    let cs = &out.changeset;

    assert_eq!(cs.word("cat").unwrap().root, None);
    assert_eq!(cs.word("dog").unwrap().root.as_deref(), Some("can"));
    let candle = cs.word("candle").unwrap();
    assert_eq!((candle.grade, candle.text.as_str()), (3, "Candle"));
    assert!(cs.same_root("dog", "candle"));
    assert!(!cs.same_root("cat", "dog"));
    assert_eq!(cs.same_root_pairs().count(), 1);
}

#[tokio::test]
async fn wrong_answers_flow_into_the_mistake_book() {
    let graph = Arc::new(MemoryGraph::new());
    import_into(graph.as_ref()).await;

    let mut engine = QuizEngine::new(graph, seeded(11));
    let mut book = MistakeLog::new();
    let start = engine.start_floor(1).await.unwrap();
    // four single words; the phrase is left out
    assert_eq!(start.question_count, 4);

    let mut wrong = Vec::new();
    let mut prompts = HashSet::new();
    while let Ok(q) = engine.next_question().await {
        prompts.insert(q.prompt.clone());
        assert_eq!(q.options.len(), 4);
        let outcome = engine.submit_answer(q.id, 0, &mut book).unwrap();
        if !outcome.correct {
            wrong.push(q.prompt.to_lowercase());
        }
    }
    assert!(!prompts.contains("give up"));
    assert_eq!(engine.state(), SessionState::FloorComplete { tier: 1 });

    let listed: Vec<_> = book.list(ListFilter::Unmastered).map(|e| e.word.key.clone()).collect();
    assert_eq!(listed, wrong);

    let summary = engine.finish().unwrap();
    assert_eq!(summary.total_questions(), 4);
    assert_eq!(summary.total_correct(), 4 - wrong.len());
}

#[tokio::test]
async fn master_then_miss_again() {
    let graph = Arc::new(MemoryGraph::new());
    import_into(graph.as_ref()).await;
    let dog = graph
        .query_words_by_grade(1)
        .await
        .unwrap()
        .into_iter()
        .find(|w| w.key == "dog")
        .unwrap()
        .to_ref();

    let mut book = MistakeLog::new();
    book.record(&dog);
    book.mark_mastered("dog");
    assert_eq!(book.pending().count(), 0);
    book.record(&dog);
    let entry = book.get("dog").unwrap();
    assert!(!entry.mastered);
    assert_eq!(entry.attempts, 2);
}

#[tokio::test]
async fn file_graph_serves_a_later_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    {
        let graph = FileGraph::open(&path).unwrap();
        import_into(&graph).await;
    }

    let graph = Arc::new(FileGraph::open(&path).unwrap());
    let mut engine = QuizEngine::new(graph, seeded(5));
    engine.start_floor(3).await.unwrap();
    let q = engine.next_question().await.unwrap();
    assert_eq!(q.prompt, "Candle");
    // grade 3 has one word, so distractors come from grade 1
    assert_eq!(q.options.len(), 4);
    assert!(q.options.contains(&"蜡烛".to_string()));

    let family = engine.explore_family("can").await.unwrap();
    assert_eq!(family.len(), 2);
}

#[tokio::test]
async fn mock_outage_fails_one_call_only() {
    let store = Arc::new(MockStore::new());
    import_into(store.as_ref()).await;
    let calls = store.call_count();

    let limited = Arc::new(MockStore::failing_after(calls + 1));
    import_into(limited.as_ref()).await;
    let mut engine = QuizEngine::new(limited.clone(), seeded(1));

    // the first query succeeds, everything after it fails
    engine.start_floor(1).await.unwrap();
    let err = engine.start_floor(3).await.unwrap_err();
    assert!(matches!(err, QuizError::FloorInProgress { tier: 1 }));
    let err = engine.explore_family("can").await.unwrap_err();
    assert!(matches!(err, QuizError::Store(StoreError::Unavailable(_))));
    assert_eq!(engine.state(), SessionState::FloorInProgress { tier: 1 });

    // questions on floor 1 need no more store calls
    let q = engine.next_question().await.unwrap();
    engine.submit_answer(q.id, 0, &mut NoopSink).unwrap();
}

#[tokio::test]
async fn purge_removes_word_everywhere() {
    let graph = MemoryGraph::new();
    import_into(&graph).await;
    let mut book = MistakeLog::new();
    let candle = graph.query_family("can").await.unwrap()[0].to_ref();
    assert_eq!(candle.key, "candle");
    book.record(&candle);

    assert!(purge_word(&graph, &mut book, "CANDLE").await.unwrap());
    assert!(book.get("candle").is_none());
    assert_eq!(graph.query_family("can").await.unwrap().len(), 1);
    assert!(!purge_word(&graph, &mut book, "candle").await.unwrap());
}
