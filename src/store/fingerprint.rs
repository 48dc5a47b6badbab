//! Corpus identity stamp for derived artifacts.

use bincode::{Decode, Encode};

/// SHA-256 of a corpus snapshot.
///
/// Persisted next to the vectorizer and index so a load can tell whether they
/// were derived from the documents sitting beside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct CorpusFingerprint([u8; 32]);

impl CorpusFingerprint {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight bytes in hex, for log lines.
    #[must_use]
    pub fn short_hex(&self) -> String {
        self.0[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for CorpusFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
