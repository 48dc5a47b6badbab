//! Test: reopening an index whose files were damaged, removed or edited.

use docvec::storage::{DOCUMENTS_FILE_NAME, VECTORIZER_FILE_NAME};
use docvec::vector::INDEX_FILE_NAME;
use docvec::{DocumentIndex, Durability, IndexOptions, IndexState, LoadReport};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn seed(path: &Path) {
    let index = DocumentIndex::open(path, IndexOptions::default()).unwrap();
    index
        .add_documents(
            vec![
                "rust ownership and borrowing".to_string(),
                "python garbage collection".to_string(),
                "borrowing books from the library".to_string(),
            ],
            None,
            None,
        )
        .unwrap();
}

#[test]
fn test_missing_index_file_is_rebuilt() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());
    fs::remove_file(temp_dir.path().join(INDEX_FILE_NAME)).unwrap();

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    match index.load_report() {
        LoadReport::Rebuilt {
            documents,
            durability,
            ..
        } => {
            assert_eq!(*documents, 3);
            assert_eq!(*durability, Durability::Persisted);
        }
        other => panic!("expected a rebuild, got {other:?}"),
    }
    assert_eq!(index.state(), IndexState::Ready);
    assert!(temp_dir.path().join(INDEX_FILE_NAME).exists());

    let hits = index.query("borrowing", 3).unwrap();
    assert_eq!(hits.len(), 2);

    // The rebuild was saved, so the next open loads directly
    let again = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert_eq!(*again.load_report(), LoadReport::Loaded { documents: 3 });
}

#[test]
fn test_hand_edited_documents_trigger_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    let documents_path = temp_dir.path().join(DOCUMENTS_FILE_NAME);
    let edited = fs::read_to_string(&documents_path)
        .unwrap()
        .replace("python garbage collection", "python borrowing semantics");
    fs::write(&documents_path, edited).unwrap();

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert!(matches!(
        index.load_report(),
        LoadReport::Rebuilt { documents: 3, .. }
    ));

    let hits = index.query("python", 3).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "python borrowing semantics");
}

#[test]
fn test_corrupt_vectorizer_resets_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());
    fs::write(temp_dir.path().join(VECTORIZER_FILE_NAME), b"not bincode").unwrap();

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert!(matches!(index.load_report(), LoadReport::Reset { .. }));
    assert_eq!(index.state(), IndexState::Empty);
    assert!(index.list_documents().is_empty());
    assert!(index.query("rust", 3).unwrap().is_empty());

    // The index is usable again and the next save replaces the damaged files
    let outcome = index
        .add_documents(vec!["fresh start".to_string()], None, None)
        .unwrap();
    assert_eq!(outcome.durability, Durability::Persisted);

    let reopened = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert_eq!(*reopened.load_report(), LoadReport::Loaded { documents: 1 });
}

#[test]
fn test_truncated_documents_reset_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    let documents_path = temp_dir.path().join(DOCUMENTS_FILE_NAME);
    let bytes = fs::read(&documents_path).unwrap();
    fs::write(&documents_path, &bytes[..bytes.len() / 2]).unwrap();

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert!(matches!(index.load_report(), LoadReport::Reset { .. }));
    assert!(index.is_empty());
}

#[test]
fn test_truncated_index_file_resets_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    let index_path = temp_dir.path().join(INDEX_FILE_NAME);
    let bytes = fs::read(&index_path).unwrap();
    fs::write(&index_path, &bytes[..bytes.len() - 3]).unwrap();

    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert!(matches!(index.load_report(), LoadReport::Reset { .. }));
    assert_eq!(index.state(), IndexState::Empty);
}

#[test]
fn test_failed_save_keeps_mutation_in_memory() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());
    let index = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();

    // A non-empty directory where documents.json belongs cannot be replaced
    let documents_path = temp_dir.path().join(DOCUMENTS_FILE_NAME);
    fs::remove_file(&documents_path).unwrap();
    fs::create_dir_all(documents_path.join("blocked")).unwrap();

    let outcome = index
        .add_documents(vec!["written while blocked".to_string()], None, None)
        .unwrap();
    assert!(matches!(outcome.durability, Durability::InMemoryOnly { .. }));
    assert_eq!(index.len(), 4);
    assert_eq!(index.query("written", 1).unwrap()[0].id, outcome.ids[0]);

    // Once the path is clear again the next mutation persists everything
    fs::remove_dir_all(&documents_path).unwrap();
    let outcome = index
        .add_documents(vec!["written after recovery".to_string()], None, None)
        .unwrap();
    assert_eq!(outcome.durability, Durability::Persisted);
    drop(index);

    let reopened = DocumentIndex::open(temp_dir.path(), IndexOptions::default()).unwrap();
    assert_eq!(reopened.load_report(), &LoadReport::Loaded { documents: 5 });
}
