//! Test: an index configured entirely from a settings file.

use docvec::{DocumentIndex, IndexError, Settings};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_index_follows_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let index_dir = temp_dir.path().join("store");
    let settings_path = temp_dir.path().join("settings.toml");
    let settings_content = format!(
        r#"
version = 1
index_path = "{}"
collection_name = "research"

[vectorizer]
max_features = 3

[search]
default_limit = 2
min_score = 0.0
"#,
        index_dir.display().to_string().replace('\\', "/")
    );
    std::fs::write(&settings_path, settings_content).unwrap();

    let settings = Settings::load_from(&settings_path).expect("Should load settings");
    assert_eq!(settings.vectorizer.max_features, 3);
    assert_eq!(settings.search.default_limit, 2);
    assert_eq!(settings.resolved_index_path(), index_dir);

    let index = DocumentIndex::with_settings(Arc::new(settings)).unwrap();
    index
        .add_documents(
            vec![
                "alpha beta gamma delta".to_string(),
                "alpha beta epsilon".to_string(),
                "alpha zeta".to_string(),
            ],
            None,
            None,
        )
        .unwrap();

    let stats = index.get_stats();
    assert_eq!(stats.name, "research");
    assert_eq!(stats.feature_dimension, 3);
    assert_eq!(stats.vocabulary_size, 3);
    assert!(index_dir.join("documents.json").exists());
}

#[test]
fn test_invalid_settings_are_rejected() {
    let mut settings = Settings::default();
    settings.vectorizer.max_features = 0;

    let err = DocumentIndex::with_settings(Arc::new(settings)).unwrap_err();
    assert!(matches!(err, IndexError::ConfigError { .. }));
    assert_eq!(err.status_code(), "CONFIG_ERROR");
}
