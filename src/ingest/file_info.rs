//! Reading uploaded files and describing where they came from.

use chrono::{SecondsFormat, Utc};
use std::fs;
use std::path::Path;

use super::{IngestError, IngestResult};
use crate::store::{Metadata, MetadataValue};

/// Get current UTC timestamp in seconds since UNIX_EPOCH
pub fn get_utc_timestamp() -> u64 {
    // Use chrono for accurate cross-platform timestamp
    Utc::now().timestamp() as u64
}

/// Source metadata attached to every ingested document.
///
/// Keys: `filename`, `file_size`, `file_path` and `uploaded_at` (RFC 3339, UTC).
pub fn file_metadata(path: &Path, file_size: u64) -> Metadata {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut metadata = Metadata::new();
    metadata.insert("filename".to_string(), MetadataValue::from(filename));
    metadata.insert("file_size".to_string(), MetadataValue::from(file_size));
    metadata.insert(
        "file_path".to_string(),
        MetadataValue::from(path.display().to_string()),
    );
    metadata.insert(
        "uploaded_at".to_string(),
        MetadataValue::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    metadata
}

/// Reads a file as text, replacing invalid UTF-8 sequences.
///
/// Returns the text and the file size in bytes. Files larger than `max_size`
/// are rejected without being read.
pub fn read_document(path: &Path, max_size: u64) -> IngestResult<(String, u64)> {
    let io_error = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(io_error)?.len();
    if size > max_size {
        return Err(IngestError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_size,
        });
    }

    let bytes = fs::read(path).map_err(io_error)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok((text, bytes.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_metadata_fields() {
        let metadata = file_metadata(Path::new("/uploads/notes.txt"), 9);
        assert_eq!(metadata["filename"], MetadataValue::from("notes.txt"));
        assert_eq!(metadata["file_size"].as_i64(), Some(9));
        assert_eq!(metadata["file_path"], MetadataValue::from("/uploads/notes.txt"));

        let uploaded_at = metadata["uploaded_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(uploaded_at).is_ok());
    }

    #[test]
    fn test_read_document_decodes_lossily() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mixed.txt");
        fs::write(&path, b"caf\xc3\xa9 \xff bytes").unwrap();

        let (text, size) = read_document(&path, 1024).unwrap();
        assert_eq!(text, "café \u{fffd} bytes");
        assert_eq!(size, 13);
    }

    #[test]
    fn test_read_document_enforces_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.txt");
        fs::write(&path, "0123456789").unwrap();

        assert!(matches!(
            read_document(&path, 4),
            Err(IngestError::TooLarge { size: 10, limit: 4, .. })
        ));
        assert!(matches!(
            read_document(&temp_dir.path().join("missing.txt"), 4),
            Err(IngestError::Io { .. })
        ));
    }

    #[test]
    fn test_utc_timestamp_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(get_utc_timestamp() > 1_577_836_800);
    }
}
