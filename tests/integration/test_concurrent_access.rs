//! Test: readers and writers sharing one index across threads.

use docvec::{DocumentIndex, IndexOptions};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_queries_see_consistent_snapshots_during_writes() {
    let temp_dir = TempDir::new().unwrap();
    let index = Arc::new(DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap());
    index
        .add_documents(vec!["shared topic seed".to_string()], None, None)
        .unwrap();

    let writer = {
        let index = Arc::clone(&index);
        thread::spawn(move || {
            for i in 0..20 {
                index
                    .add_documents(vec![format!("shared topic number {i}")], None, None)
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..50 {
                    let hits = index.query("shared topic", 100).unwrap();
                    assert!(!hits.is_empty());
                    for hit in &hits {
                        assert!(hit.score > 0.0 && hit.score <= 1.0 + 1e-5);
                        assert!((hit.distance - (1.0 - hit.score)).abs() < 1e-6);
                    }
                    let mut ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
                    ids.sort_unstable();
                    ids.dedup();
                    assert_eq!(ids.len(), hits.len());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(index.len(), 21);
    let stats = index.get_stats();
    assert_eq!(stats.index_size, 21);

    let reopened = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert_eq!(reopened.len(), 21);
}

#[test]
fn test_parallel_adds_get_unique_ids() {
    let index = Arc::new(DocumentIndex::in_memory(IndexOptions::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                (0..5)
                    .flat_map(|i| {
                        index
                            .add_documents(vec![format!("thread {t} entry {i}")], None, None)
                            .unwrap()
                            .ids
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(index.len(), 20);
}
