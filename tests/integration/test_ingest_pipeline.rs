//! Test: walking a directory and feeding it through the ingestion queue.

use docvec::ingest::{IGNORE_FILE_NAME, IngestQueue, collect_files};
use docvec::{DocumentIndex, IndexOptions, MetadataValue};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_directory_ingest_indexes_matching_files() {
    let source = TempDir::new().unwrap();
    let root = source.path();
    fs::create_dir_all(root.join("notes/archive")).unwrap();
    fs::write(root.join("notes/cats.txt"), "cats purr and nap in the sun").unwrap();
    fs::write(root.join("notes/dogs.md"), "dogs fetch sticks in the park").unwrap();
    fs::write(root.join("notes/archive/old.txt"), "archived budget figures").unwrap();
    fs::write(root.join("notes/image.png"), [0u8, 159, 146, 150]).unwrap();
    fs::write(root.join("notes").join(IGNORE_FILE_NAME), "archive/\n").unwrap();

    let (files, missing) = collect_files(
        &[root.join("notes"), root.join("nowhere")],
        &["txt", "md"],
    );
    assert_eq!(missing, vec![root.join("nowhere")]);
    assert_eq!(files.len(), 2);

    let index_dir = TempDir::new().unwrap();
    let index = Arc::new(DocumentIndex::open(index_dir.path(), IndexOptions::default()).unwrap());

    let queue = IngestQueue::start(Arc::clone(&index), 1024 * 1024);
    for file in &files {
        queue.submit(file).unwrap();
    }
    let summary = queue.shutdown().unwrap();

    assert_eq!(summary.indexed.len(), 2);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.not_durable, 0);

    let hits = index.query("cats nap", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].metadata.get("filename"),
        Some(&MetadataValue::from("cats.txt"))
    );
    assert!(hits[0].metadata.contains_key("uploaded_at"));

    // Uploaded documents are persisted like any other addition
    let reopened = DocumentIndex::open(index_dir.path(), IndexOptions::default()).unwrap();
    assert_eq!(reopened.len(), 2);
}

#[test]
fn test_oversized_and_missing_files_are_skipped() {
    let source = TempDir::new().unwrap();
    let big = source.path().join("big.txt");
    fs::write(&big, "x".repeat(64)).unwrap();
    let small = source.path().join("small.txt");
    fs::write(&small, "tiny file").unwrap();

    let index = Arc::new(DocumentIndex::in_memory(IndexOptions::default()).unwrap());
    let queue = IngestQueue::start(Arc::clone(&index), 32);
    queue.submit(&big).unwrap();
    queue.submit(source.path().join("gone.txt")).unwrap();
    queue.submit(&small).unwrap();
    let summary = queue.shutdown().unwrap();

    assert_eq!(summary.indexed.len(), 1);
    assert_eq!(summary.indexed[0].0, small);
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.processed(), 3);
    assert_eq!(index.len(), 1);
}
