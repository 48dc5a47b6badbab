//! Document and metadata types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar metadata value attached to a document.
///
/// Serialized untagged, so metadata reads and writes as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Parses a command-line style value: booleans, then integers, then floats,
    /// falling back to text.
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
            return Self::Float(f);
        }
        Self::Text(raw.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Integer)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered metadata mapping.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// An owned document as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A borrowed view of one row of the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentRef<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub metadata: &'a Metadata,
}

impl DocumentRef<'_> {
    pub fn to_document(&self) -> Document {
        Document {
            id: self.id.to_string(),
            text: self.text.to_string(),
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_value_parse() {
        assert_eq!(MetadataValue::parse("true"), MetadataValue::Bool(true));
        assert_eq!(MetadataValue::parse("42"), MetadataValue::Integer(42));
        assert_eq!(MetadataValue::parse("2.5"), MetadataValue::Float(2.5));
        assert_eq!(
            MetadataValue::parse("notes.txt"),
            MetadataValue::Text("notes.txt".to_string())
        );
        assert_eq!(
            MetadataValue::parse("inf"),
            MetadataValue::Text("inf".to_string())
        );
    }

    #[test]
    fn test_metadata_serializes_as_plain_json() {
        let mut metadata = Metadata::new();
        metadata.insert("filename".to_string(), "test.txt".into());
        metadata.insert("file_size".to_string(), 9i64.into());
        metadata.insert("ratio".to_string(), 0.5.into());
        metadata.insert("public".to_string(), false.into());

        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(
            json,
            r#"{"file_size":9,"filename":"test.txt","public":false,"ratio":0.5}"#
        );

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_document_ref_to_document() {
        let metadata = Metadata::new();
        let doc_ref = DocumentRef {
            id: "a",
            text: "cats are pets",
            metadata: &metadata,
        };
        let doc = doc_ref.to_document();
        assert_eq!(doc.id, "a");
        assert_eq!(doc.text, "cats are pets");
        assert!(doc.metadata.is_empty());
    }
}
