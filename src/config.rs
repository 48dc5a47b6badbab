//! Configuration module for the document index.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCVEC_` and use double
//! underscores to separate nested levels:
//! - `DOCVEC_VECTORIZER__MAX_FEATURES=500` sets `vectorizer.max_features`
//! - `DOCVEC_SEARCH__MIN_SCORE=0.05` sets `search.min_score`
//! - `DOCVEC_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::coordinator::DEFAULT_MIN_SCORE;
use crate::error::{IndexError, IndexResult};
use crate::vector::DEFAULT_MAX_FEATURES;

/// Directory holding settings and, by default, the index itself.
pub const CONFIG_DIR_NAME: &str = ".docvec";

/// Settings file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path to the index directory
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Workspace root directory (where .docvec is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Name reported in stats output
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Vectorizer settings
    #[serde(default)]
    pub vectorizer: VectorizerConfig,

    /// Query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// File ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VectorizerConfig {
    /// Maximum vocabulary size
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Results returned when no limit is given
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Hits scoring at or below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IngestConfig {
    /// File extensions picked up when ingesting a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Console log level (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file; always receives debug output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR_NAME).join("index")
}
fn default_collection_name() -> String {
    "documents".to_string()
}
fn default_false() -> bool {
    false
}
fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}
fn default_limit() -> usize {
    5
}
fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}
fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "md".to_string()]
}
fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            workspace_root: None,
            collection_name: default_collection_name(),
            debug: false,
            vectorizer: VectorizerConfig::default(),
            search: SearchConfig::default(),
            ingest: IngestConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            min_score: default_min_score(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    /// Defaults, then the TOML file, then `DOCVEC_` environment variables.
    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed("DOCVEC_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .docvec directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Get the workspace root directory (where .docvec is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR_NAME);
            if config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'docvec init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Index directory, resolved against the workspace root when relative.
    pub fn resolved_index_path(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.index_path.is_relative() => root.join(&self.index_path),
            _ => self.index_path.clone(),
        }
    }

    /// Rejects values the index cannot work with.
    pub fn validate(&self) -> IndexResult<()> {
        if self.vectorizer.max_features == 0 {
            return Err(IndexError::ConfigError {
                reason: "vectorizer.max_features must be at least 1".to_string(),
            });
        }
        if self.search.default_limit == 0 {
            return Err(IndexError::ConfigError {
                reason: "search.default_limit must be at least 1".to_string(),
            });
        }
        if !self.search.min_score.is_finite() {
            return Err(IndexError::ConfigError {
                reason: format!("search.min_score must be finite, got {}", self.search.min_score),
            });
        }
        if self.collection_name.trim().is_empty() {
            return Err(IndexError::ConfigError {
                reason: "collection_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments in the current
    /// directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file under `base/.docvec`
    pub fn init_config_file_in(
        base: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# docvec configuration file

# Version of the configuration schema
version = 1

# Path to the index directory (relative to the workspace root)
index_path = ".docvec/index"

# Name reported by `docvec stats`
collection_name = "{collection}"

# Global debug mode
debug = false

[vectorizer]
# Maximum number of terms kept in the vocabulary.
# Terms are ranked by total frequency across all documents.
max_features = {max_features}

[search]
# Results returned by `docvec search` when -n is not given
default_limit = {limit}

# Hits with a cosine score at or below this value are dropped
min_score = {min_score}

[ingest]
# File extensions picked up when ingesting a directory
extensions = ["txt", "md"]

# Files larger than this many bytes are skipped (1 GiB)
max_file_size = {max_file_size}

[logging]
# Console level: error, warn, info, debug, trace
# DOCVEC_LOG overrides this with a full filter directive
level = "{level}"

# Uncomment to also write debug output to a file
# file = ".docvec/logs/docvec.log"
"#,
            collection = default_collection_name(),
            max_features = DEFAULT_MAX_FEATURES,
            limit = default_limit(),
            min_score = default_min_score(),
            max_file_size = default_max_file_size(),
            level = default_log_level(),
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.index_path, PathBuf::from(".docvec/index"));
        assert_eq!(settings.vectorizer.max_features, 1000);
        assert_eq!(settings.search.min_score, 0.01);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
collection_name = "notes"

[vectorizer]
max_features = 250

[search]
min_score = 0.2

[ingest]
extensions = ["log"]
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.collection_name, "notes");
        assert_eq!(settings.vectorizer.max_features, 250);
        assert_eq!(settings.search.min_score, 0.2);
        // Defaults survive inside a partially specified table
        assert_eq!(settings.search.default_limit, 5);
        assert_eq!(settings.ingest.extensions, vec!["log"]);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.vectorizer.max_features = 42;
        settings.logging.file = Some(PathBuf::from("app.log"));

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.vectorizer.max_features, 42);
        assert_eq!(loaded.logging.file, Some(PathBuf::from("app.log")));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = Settings::init_config_file_in(temp_dir.path(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Settings = toml::from_str(&content).unwrap();
        assert_eq!(parsed, Settings::default());

        // A second init needs --force
        assert!(Settings::init_config_file_in(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file_in(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.vectorizer.max_features = 0;
        assert!(matches!(
            settings.validate(),
            Err(IndexError::ConfigError { .. })
        ));

        let mut settings = Settings::default();
        settings.search.min_score = f32::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_resolved_index_path() {
        let mut settings = Settings::default();
        assert_eq!(settings.resolved_index_path(), PathBuf::from(".docvec/index"));

        settings.workspace_root = Some(PathBuf::from("/work"));
        assert_eq!(
            settings.resolved_index_path(),
            PathBuf::from("/work/.docvec/index")
        );

        settings.index_path = PathBuf::from("/abs/index");
        assert_eq!(settings.resolved_index_path(), PathBuf::from("/abs/index"));
    }
}
