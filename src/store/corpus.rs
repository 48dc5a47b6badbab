//! Parallel-sequence document store.
//!
//! Position `i` across `ids`, `texts` and `metadata` describes one document.
//! The three vectors always have the same length; removal shifts later rows
//! down so there are never gaps.

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{CorpusFingerprint, DocumentRef, Metadata};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error(
        "Corpus sequences differ in length: {ids} ids, {texts} texts, {metadata} metadata entries"
    )]
    LengthMismatch {
        ids: usize,
        texts: usize,
        metadata: usize,
    },
}

/// Ordered corpus state, the source of truth for every derived artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    ids: Vec<String>,
    texts: Vec<String>,
    metadata: Vec<Metadata>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassembles a store from its three sequences, rejecting ragged input.
    pub fn from_parts(
        ids: Vec<String>,
        texts: Vec<String>,
        metadata: Vec<Metadata>,
    ) -> Result<Self, StoreError> {
        let store = Self {
            ids,
            texts,
            metadata,
        };
        store.validate()?;
        Ok(store)
    }

    /// Adds one row at the end.
    pub fn append(&mut self, id: impl Into<String>, text: impl Into<String>, metadata: Metadata) {
        self.ids.push(id.into());
        self.texts.push(text.into());
        self.metadata.push(metadata);
    }

    /// Removes the first row whose id matches. Returns whether one was found.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        self.ids.remove(position);
        self.texts.remove(position);
        self.metadata.remove(position);
        true
    }

    /// First position holding `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|stored| stored == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    pub fn get(&self, position: usize) -> Option<DocumentRef<'_>> {
        Some(DocumentRef {
            id: self.ids.get(position)?,
            text: self.texts.get(position)?,
            metadata: self.metadata.get(position)?,
        })
    }

    pub fn get_by_id(&self, id: &str) -> Option<DocumentRef<'_>> {
        self.get(self.position_of(id)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = DocumentRef<'_>> {
        self.ids
            .iter()
            .zip(&self.texts)
            .zip(&self.metadata)
            .map(|((id, text), metadata)| DocumentRef { id, text, metadata })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// SHA-256 over every `(id, text)` pair in order.
    ///
    /// Each field is length-prefixed so `("ab", "c")` and `("a", "bc")` hash
    /// differently.
    pub fn fingerprint(&self) -> CorpusFingerprint {
        let mut hasher = Sha256::new();
        hasher.update((self.len() as u64).to_le_bytes());
        for (id, text) in self.ids.iter().zip(&self.texts) {
            hasher.update((id.len() as u64).to_le_bytes());
            hasher.update(id.as_bytes());
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        CorpusFingerprint::from_bytes(hasher.finalize().into())
    }

    /// Checks the equal-length invariant.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.ids.len() != self.texts.len() || self.ids.len() != self.metadata.len() {
            return Err(StoreError::LengthMismatch {
                ids: self.ids.len(),
                texts: self.texts.len(),
                metadata: self.metadata.len(),
            });
        }
        Ok(())
    }
}
