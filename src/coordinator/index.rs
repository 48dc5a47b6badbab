//! The document index: corpus, vectorizer and similarity index behind one lock.
//!
//! Every mutation follows the same cycle while holding the writer lock:
//! change the corpus, refit the vectorizer over all texts, rebuild the index
//! over all rows, persist. Nothing is updated incrementally, so the derived
//! pair always describes exactly the corpus beside it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::types::{
    AddOutcome, BatchOutcome, DeleteOutcome, Durability, IndexOptions, IndexState, IndexStats,
    LoadReport, SearchResult,
};
use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::storage::{DerivedLoad, IndexPersistence, PersistedState, Snapshot};
use crate::store::{Document, DocumentStore, Metadata};
use crate::vector::{SimilarityIndex, VectorError, distance_from_score};
use crate::vectorizer::TfidfVectorizer;

/// Vectorizer and index fitted to the same corpus snapshot.
#[derive(Debug, Clone)]
struct Derived {
    vectorizer: TfidfVectorizer,
    index: SimilarityIndex,
}

/// Lock contents captured before a mutation, restored if its rebuild fails.
#[derive(Debug)]
struct Checkpoint {
    store: DocumentStore,
    derived: Option<Derived>,
    next_sequence: u64,
}

/// Everything guarded by the lock.
#[derive(Debug, Default)]
struct IndexInner {
    store: DocumentStore,
    /// `None` while empty or stale
    derived: Option<Derived>,
    /// Next candidate for generated `doc_<n>` ids
    next_sequence: u64,
}

impl IndexInner {
    fn state(&self) -> IndexState {
        match (&self.derived, self.store.is_empty()) {
            (_, true) => IndexState::Empty,
            (Some(_), false) => IndexState::Ready,
            (None, false) => IndexState::Stale,
        }
    }

    /// Validates a whole add request, then appends it.
    ///
    /// Nothing is appended unless every document is acceptable.
    fn append_documents(
        &mut self,
        texts: Vec<String>,
        metadata: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> IndexResult<Vec<String>> {
        let count = texts.len();
        if let Some(len) = metadata.as_ref().map(Vec::len).filter(|len| *len != count) {
            return Err(IndexError::InvalidInput {
                reason: format!("{count} texts but {len} metadata entries"),
            });
        }
        if let Some(len) = ids.as_ref().map(Vec::len).filter(|len| *len != count) {
            return Err(IndexError::InvalidInput {
                reason: format!("{count} texts but {len} ids"),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(count);
        if let Some(ids) = &ids {
            for id in ids {
                if id.trim().is_empty() {
                    return Err(IndexError::InvalidInput {
                        reason: "document ids must not be empty".to_string(),
                    });
                }
                if self.store.contains(id) || !seen.insert(id.as_str()) {
                    return Err(IndexError::DuplicateId { id: id.clone() });
                }
            }
        }

        let ids = match ids {
            Some(ids) => ids,
            None => (0..count).map(|_| self.generate_id()).collect(),
        };
        let metadata = metadata.unwrap_or_else(|| vec![Metadata::new(); count]);

        for ((id, text), metadata) in ids.iter().zip(texts).zip(metadata) {
            self.store.append(id.clone(), text, metadata);
        }
        self.derived = None;

        Ok(ids)
    }

    /// Next `doc_<n>` id not already present in the store.
    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("doc_{}", self.next_sequence);
            self.next_sequence += 1;
            if !self.store.contains(&id) {
                return id;
            }
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let found = self.store.remove_by_id(id);
        if found {
            self.derived = None;
        }
        found
    }

    /// Refits the vectorizer and rebuilds the index from the whole corpus.
    fn rebuild(&mut self, max_features: usize) -> Result<(), VectorError> {
        self.derived = None;
        if self.store.is_empty() {
            return Ok(());
        }

        let (vectorizer, rows) = TfidfVectorizer::fit_transform(self.store.texts(), max_features);
        // A corpus made only of stopwords has no columns to index
        let index = if vectorizer.is_empty() {
            SimilarityIndex::empty()
        } else {
            SimilarityIndex::build(rows)?
        };

        debug!(
            "Rebuilt index: {} documents, {} terms",
            index.len(),
            vectorizer.vocabulary_size()
        );
        self.derived = Some(Derived { vectorizer, index });
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            store: self.store.clone(),
            derived: self.derived.clone(),
            next_sequence: self.next_sequence,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.store = checkpoint.store;
        self.derived = checkpoint.derived;
        self.next_sequence = checkpoint.next_sequence;
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            store: &self.store,
            next_sequence: self.next_sequence,
            derived: self.derived.as_ref().map(|d| (&d.vectorizer, &d.index)),
        }
    }
}

/// A persistent TF-IDF document index with exact cosine search.
///
/// Mutations serialize on a writer lock; queries share a reader lock, so a
/// query never observes a vectorizer and index from different rebuilds.
/// Share it across threads as `Arc<DocumentIndex>`.
#[derive(Debug)]
pub struct DocumentIndex {
    options: IndexOptions,
    persistence: Option<IndexPersistence>,
    inner: RwLock<IndexInner>,
    load_report: LoadReport,
}

impl DocumentIndex {
    /// An index that never touches disk.
    pub fn in_memory(options: IndexOptions) -> IndexResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            persistence: None,
            inner: RwLock::new(IndexInner::default()),
            load_report: LoadReport::Fresh,
        })
    }

    /// Opens the index stored in `path`, creating it on first save.
    ///
    /// Missing or stale derived artifacts are rebuilt from the stored corpus
    /// before returning. Unreadable artifacts discard the persisted state and
    /// the index starts empty; see [`DocumentIndex::load_report`].
    pub fn open(path: impl Into<PathBuf>, options: IndexOptions) -> IndexResult<Self> {
        options.validate()?;
        let persistence = IndexPersistence::new(path);

        let mut index = Self {
            options,
            persistence: Some(persistence),
            inner: RwLock::new(IndexInner::default()),
            load_report: LoadReport::Fresh,
        };
        index.load_report = index.restore()?;
        info!("{}", index.load_report);
        Ok(index)
    }

    /// Opens the index configured by `settings`.
    pub fn with_settings(settings: Arc<Settings>) -> IndexResult<Self> {
        settings.validate()?;
        Self::open(
            settings.resolved_index_path(),
            IndexOptions::from_settings(&settings),
        )
    }

    fn restore(&mut self) -> IndexResult<LoadReport> {
        let Some(persistence) = &self.persistence else {
            return Ok(LoadReport::Fresh);
        };

        let state = match persistence.load() {
            Ok(Some(state)) => state,
            Ok(None) => return Ok(LoadReport::Fresh),
            Err(e) => {
                let kind = if e.is_corruption() {
                    "corrupt"
                } else {
                    "unreadable"
                };
                warn!(
                    "Discarding {kind} index at {}: {e}",
                    persistence.base_path().display()
                );
                return Ok(LoadReport::Reset {
                    reason: e.to_string(),
                });
            }
        };

        let PersistedState {
            store,
            next_sequence,
            derived,
        } = state;
        let documents = store.len();
        let inner = self.inner.get_mut();
        inner.store = store;
        inner.next_sequence = next_sequence;

        if documents == 0 {
            return Ok(LoadReport::Loaded { documents });
        }

        let reason = match derived {
            DerivedLoad::Current { vectorizer, .. }
                if vectorizer.max_features() != self.options.max_features =>
            {
                format!(
                    "max_features changed from {} to {}",
                    vectorizer.max_features(),
                    self.options.max_features
                )
            }
            DerivedLoad::Current { vectorizer, index } => {
                inner.derived = Some(Derived { vectorizer, index });
                return Ok(LoadReport::Loaded { documents });
            }
            DerivedLoad::Missing => "derived artifacts missing".to_string(),
            DerivedLoad::Stale { reason } => reason,
        };

        info!("Rebuilding index from {documents} stored documents: {reason}");
        inner.rebuild(self.options.max_features)?;
        let durability = self.persist(&self.inner.read());
        Ok(LoadReport::Rebuilt {
            documents,
            reason,
            durability,
        })
    }

    /// Writes the current state, downgrading to `InMemoryOnly` on failure.
    fn persist(&self, inner: &IndexInner) -> Durability {
        let Some(persistence) = &self.persistence else {
            return Durability::Ephemeral;
        };
        match persistence.save(inner.snapshot()) {
            Ok(()) => Durability::Persisted,
            Err(e) => {
                warn!(
                    "Failed to persist index to {}: {e}",
                    persistence.base_path().display()
                );
                Durability::InMemoryOnly {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Rebuild then persist. Called with the writer lock held.
    ///
    /// A failed rebuild puts `checkpoint` back, so the corpus never sits
    /// beside missing derived state.
    fn commit(&self, inner: &mut IndexInner, checkpoint: Checkpoint) -> IndexResult<Durability> {
        let max_features = self.options.max_features;
        self.commit_with(inner, checkpoint, |inner| inner.rebuild(max_features))
    }

    fn commit_with<F>(
        &self,
        inner: &mut IndexInner,
        checkpoint: Checkpoint,
        rebuild: F,
    ) -> IndexResult<Durability>
    where
        F: FnOnce(&mut IndexInner) -> Result<(), VectorError>,
    {
        if let Err(e) = rebuild(inner) {
            warn!("Rebuild failed, reverting to {} documents: {e}", checkpoint.store.len());
            inner.restore(checkpoint);
            return Err(e.into());
        }
        Ok(self.persist(inner))
    }

    /// Adds documents and rebuilds.
    ///
    /// `metadata` and `ids`, when given, must have one entry per text. Omitted
    /// ids are generated as `doc_<n>`. An id already in the index, or repeated
    /// within the request, rejects the whole request before anything changes.
    pub fn add_documents(
        &self,
        texts: Vec<String>,
        metadata: Option<Vec<Metadata>>,
        ids: Option<Vec<String>>,
    ) -> IndexResult<AddOutcome> {
        if texts.is_empty() {
            return Err(IndexError::InvalidInput {
                reason: "no documents to add".to_string(),
            });
        }

        let mut inner = self.inner.write();
        let checkpoint = inner.checkpoint();
        let ids = inner.append_documents(texts, metadata, ids)?;
        let durability = self.commit(&mut inner, checkpoint)?;

        info!("Added {} documents ({} total)", ids.len(), inner.store.len());
        Ok(AddOutcome { ids, durability })
    }

    /// Adds a single document.
    pub fn add_document(
        &self,
        text: impl Into<String>,
        metadata: Metadata,
        id: Option<String>,
    ) -> IndexResult<AddOutcome> {
        self.add_documents(vec![text.into()], Some(vec![metadata]), id.map(|id| vec![id]))
    }

    /// Removes the first document with `id` and rebuilds.
    pub fn delete_by_id(&self, id: &str) -> IndexResult<DeleteOutcome> {
        let mut inner = self.inner.write();
        if !inner.store.contains(id) {
            debug!("Delete of unknown document {id}");
            return Ok(DeleteOutcome {
                found: false,
                durability: None,
            });
        }

        let checkpoint = inner.checkpoint();
        inner.remove(id);

        let durability = self.commit(&mut inner, checkpoint)?;
        info!("Deleted document {id} ({} remaining)", inner.store.len());
        Ok(DeleteOutcome {
            found: true,
            durability: Some(durability),
        })
    }

    /// Runs several adds and deletes under one writer lock with a single
    /// rebuild at the end.
    ///
    /// If `f` returns an error every change it made is rolled back and the
    /// index is left as it was.
    pub fn batch<T, F>(&self, f: F) -> IndexResult<BatchOutcome<T>>
    where
        F: FnOnce(&mut IndexBatch<'_>) -> IndexResult<T>,
    {
        let mut inner = self.inner.write();
        let checkpoint = inner.checkpoint();

        let mut batch = IndexBatch {
            inner: &mut inner,
            added: Vec::new(),
            removed: 0,
        };
        let result = f(&mut batch);
        let IndexBatch { added, removed, .. } = batch;

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                inner.restore(checkpoint);
                return Err(e);
            }
        };

        if added.is_empty() && removed == 0 {
            return Ok(BatchOutcome {
                value,
                added,
                removed,
                durability: None,
            });
        }

        let durability = self.commit(&mut inner, checkpoint)?;
        info!(
            "Batch added {} and removed {removed} documents ({} total)",
            added.len(),
            inner.store.len()
        );
        Ok(BatchOutcome {
            value,
            added,
            removed,
            durability: Some(durability),
        })
    }

    /// Finds the `k` documents most similar to `text`.
    ///
    /// Never fails on an empty index or a query with no known terms; both
    /// return no results. Hits scoring at or below the configured minimum are
    /// dropped, so fewer than `k` results may come back.
    pub fn query(&self, text: &str, k: usize) -> IndexResult<Vec<SearchResult>> {
        let inner = self.inner.read();
        let Some(derived) = inner.derived.as_ref() else {
            return Ok(Vec::new());
        };
        if k == 0 || derived.index.is_empty() {
            return Ok(Vec::new());
        }

        let vector = derived.vectorizer.transform(text);
        if vector.iter().all(|v| *v == 0.0) {
            return Ok(Vec::new());
        }

        let hits = derived.index.search(&vector, k)?;
        let results = hits
            .into_iter()
            .filter(|hit| hit.score > self.options.min_score)
            .filter_map(|hit| {
                let doc = inner.store.get(hit.position)?;
                Some(SearchResult {
                    id: doc.id.to_string(),
                    text: doc.text.to_string(),
                    metadata: doc.metadata.clone(),
                    score: hit.score,
                    distance: distance_from_score(hit.score),
                })
            })
            .collect();
        Ok(results)
    }

    /// Refits and rebuilds from the current corpus and saves everything.
    pub fn rebuild(&self) -> IndexResult<Durability> {
        let mut inner = self.inner.write();
        let checkpoint = inner.checkpoint();
        let durability = self.commit(&mut inner, checkpoint)?;
        info!("Rebuilt index over {} documents", inner.store.len());
        Ok(durability)
    }

    /// All documents in insertion order.
    pub fn list_documents(&self) -> Vec<Document> {
        self.inner
            .read()
            .store
            .iter()
            .map(|doc| doc.to_document())
            .collect()
    }

    pub fn get_document(&self, id: &str) -> Option<Document> {
        self.inner
            .read()
            .store
            .get_by_id(id)
            .map(|doc| doc.to_document())
    }

    pub fn get_stats(&self) -> IndexStats {
        let inner = self.inner.read();
        let (index_built, index_size, vocabulary_size) = match &inner.derived {
            Some(derived) => (
                true,
                derived.index.len(),
                derived.vectorizer.vocabulary_size(),
            ),
            None => (false, 0, 0),
        };

        IndexStats {
            name: self.options.name.clone(),
            document_count: inner.store.len(),
            index_built,
            index_size,
            feature_dimension: self.options.max_features,
            vocabulary_size,
            persist_directory: self.persist_directory().map(Path::to_path_buf),
            state: inner.state(),
        }
    }

    pub fn state(&self) -> IndexState {
        self.inner.read().state()
    }

    pub fn len(&self) -> usize {
        self.inner.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().store.is_empty()
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Directory the index persists to, `None` for in-memory indexes.
    pub fn persist_directory(&self) -> Option<&Path> {
        self.persistence.as_ref().map(IndexPersistence::base_path)
    }

    /// How the index was obtained when it was opened.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }
}

/// Mutation handle passed to [`DocumentIndex::batch`].
///
/// Changes apply to the corpus immediately; the rebuild waits until the batch
/// closure returns.
pub struct IndexBatch<'a> {
    inner: &'a mut IndexInner,
    added: Vec<String>,
    removed: usize,
}

impl IndexBatch<'_> {
    /// Adds one document, returning its id.
    pub fn add(
        &mut self,
        text: impl Into<String>,
        metadata: Metadata,
        id: Option<String>,
    ) -> IndexResult<String> {
        let mut ids = self.inner.append_documents(
            vec![text.into()],
            Some(vec![metadata]),
            id.map(|id| vec![id]),
        )?;
        let id = ids.pop().ok_or_else(|| IndexError::General("no id assigned".to_string()))?;
        self.added.push(id.clone());
        Ok(id)
    }

    /// Removes the first document with `id`. Returns whether one was found.
    pub fn delete(&mut self, id: &str) -> bool {
        let found = self.inner.remove(id);
        if found {
            self.removed += 1;
            self.added.retain(|added| added != id);
        }
        found
    }

    /// Documents currently in the corpus, including this batch's changes.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.store.contains(id)
    }
}
