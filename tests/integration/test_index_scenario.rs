//! Test: the pets/finance corpus from end to end on a persisted index.

use docvec::{DocumentIndex, IndexOptions, IndexState, LoadReport};
use tempfile::TempDir;

fn pets_corpus(index: &DocumentIndex) {
    index
        .add_documents(
            vec![
                "cats are small furry pets".to_string(),
                "dogs are loyal pets".to_string(),
                "stock markets fell sharply today".to_string(),
            ],
            None,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        )
        .unwrap();
}

#[test]
fn test_pets_query_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index");

    let before = {
        let index = DocumentIndex::open(&path, IndexOptions::default()).unwrap();
        pets_corpus(&index);
        index.query("furry pets", 2).unwrap()
    };
    assert_eq!(before[0].id, "a");
    assert!(before.iter().all(|hit| hit.id != "c"));

    let index = DocumentIndex::open(&path, IndexOptions::default()).unwrap();
    assert_eq!(*index.load_report(), LoadReport::Loaded { documents: 3 });
    assert_eq!(index.state(), IndexState::Ready);

    let after = index.query("furry pets", 2).unwrap();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.id, new.id);
        assert!((old.score - new.score).abs() < 1e-6);
    }
}

#[test]
fn test_delete_then_stats_and_query() {
    let temp_dir = TempDir::new().unwrap();
    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    pets_corpus(&index);

    let outcome = index.delete_by_id("b").unwrap();
    assert!(outcome.found);
    assert!(outcome.durability.unwrap().is_durable());

    let stats = index.get_stats();
    assert_eq!(stats.document_count, 2);
    assert_eq!(stats.index_size, 2);
    assert!(stats.index_built);
    assert_eq!(stats.persist_directory.as_deref(), Some(temp_dir.path()));

    let hits = index.query("loyal dogs", 5).unwrap();
    assert!(hits.iter().all(|hit| hit.id != "b"));

    let missing = index.delete_by_id("b").unwrap();
    assert!(!missing.found);
    assert!(missing.durability.is_none());

    let reopened = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    let ids: Vec<String> = reopened.list_documents().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn test_generated_ids_continue_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
        let outcome = index
            .add_documents(
                vec!["first note".to_string(), "second note".to_string()],
                None,
                None,
            )
            .unwrap();
        assert_eq!(outcome.ids, vec!["doc_0".to_string(), "doc_1".to_string()]);
        index.delete_by_id("doc_1").unwrap();
    }

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    let outcome = index
        .add_documents(vec!["third note".to_string()], None, None)
        .unwrap();
    // Deleted ids are not handed out again
    assert_eq!(outcome.ids, vec!["doc_2".to_string()]);
}

#[test]
fn test_empty_index_is_safe() {
    let temp_dir = TempDir::new().unwrap();
    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();

    assert_eq!(*index.load_report(), LoadReport::Fresh);
    assert_eq!(index.state(), IndexState::Empty);
    assert!(index.query("anything", 5).unwrap().is_empty());
    assert!(index.list_documents().is_empty());
    assert!(index.get_document("doc_0").is_none());

    let stats = index.get_stats();
    assert_eq!(stats.document_count, 0);
    assert!(!stats.index_built);
}
