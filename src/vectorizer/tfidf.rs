//! TF-IDF vectorizer fitted over the whole corpus.
//!
//! Weighting follows the smoothed scheme
//! `tfidf(t, d) = count(t, d) * (ln((1 + n) / (1 + df(t))) + 1)`
//! with each output row L2-normalized.

use std::collections::{BTreeMap, HashMap};

use bincode::{Decode, Encode};
use rayon::prelude::*;

use super::tokenizer::tokenize;
use crate::vector::{DEFAULT_MAX_FEATURES, l2_normalize};

/// Vocabulary and IDF weights learned from a corpus.
///
/// A fitted vectorizer is immutable. Any change to the corpus means fitting a
/// new one; `transform` only ever reads.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct TfidfVectorizer {
    /// Term to column index
    vocabulary: BTreeMap<String, u32>,

    /// IDF weight per column
    idf: Vec<f32>,

    /// Cap the vocabulary was fitted with
    max_features: usize,

    /// Number of documents seen at fit time
    document_count: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            max_features: DEFAULT_MAX_FEATURES,
            document_count: 0,
        }
    }
}

impl TfidfVectorizer {
    /// Learns a vocabulary of at most `max_features` terms from `corpus`.
    ///
    /// Terms are ranked by total count across the corpus, ties broken
    /// alphabetically. Columns are then assigned in alphabetical order. An empty
    /// corpus, or one with nothing but stopwords, yields a vectorizer with no
    /// features.
    pub fn fit<S: AsRef<str> + Sync>(corpus: &[S], max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = corpus
            .par_iter()
            .map(|text| tokenize(text.as_ref()))
            .collect();

        let mut totals: HashMap<&str, usize> = HashMap::new();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for terms in &tokenized {
            let mut seen: Vec<&str> = Vec::with_capacity(terms.len());
            for term in terms {
                *totals.entry(term.as_str()).or_default() += 1;
                seen.push(term.as_str());
            }
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);

        let mut selected: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort_unstable();

        let n = corpus.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(selected.len());
        for (column, term) in selected.into_iter().enumerate() {
            let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
            idf.push((((1.0 + n) / (1.0 + df)).ln() + 1.0) as f32);
            vocabulary.insert(term.to_string(), column as u32);
        }

        Self {
            vocabulary,
            idf,
            max_features,
            document_count: corpus.len(),
        }
    }

    /// Fits on `corpus` and returns the vectorizer with the corpus rows.
    pub fn fit_transform<S: AsRef<str> + Sync>(
        corpus: &[S],
        max_features: usize,
    ) -> (Self, Vec<Vec<f32>>) {
        let vectorizer = Self::fit(corpus, max_features);
        let rows = vectorizer.transform_batch(corpus);
        (vectorizer, rows)
    }

    /// Checks that every vocabulary term maps to its own IDF column and every
    /// weight is finite.
    ///
    /// A fitted vectorizer always passes; a decoded one may not.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "{} vocabulary terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }

        let mut taken = vec![false; self.idf.len()];
        for (term, &column) in &self.vocabulary {
            let slot = taken
                .get_mut(column as usize)
                .ok_or_else(|| format!("term '{term}' maps to column {column} out of range"))?;
            if *slot {
                return Err(format!("column {column} is assigned twice"));
            }
            *slot = true;
        }

        if let Some(column) = self.idf.iter().position(|w| !w.is_finite()) {
            return Err(format!("idf weight for column {column} is not finite"));
        }
        Ok(())
    }

    /// Projects `text` into the fitted feature space.
    ///
    /// Unknown terms are ignored; the row is L2-normalized and stays all-zero
    /// when no vocabulary term occurs.
    #[must_use]
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut row = vec![0.0f32; self.idf.len()];
        if row.is_empty() {
            return row;
        }

        for term in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                row[column as usize] += 1.0;
            }
        }
        for (value, weight) in row.iter_mut().zip(&self.idf) {
            *value *= weight;
        }
        l2_normalize(&mut row);
        row
    }

    /// `transform` over many texts in parallel, preserving input order.
    #[must_use]
    pub fn transform_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<f32>> {
        texts
            .par_iter()
            .map(|text| self.transform(text.as_ref()))
            .collect()
    }

    /// Number of columns produced by `transform`.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// True when fitting found no usable terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Column of `term`, if it made it into the vocabulary.
    #[must_use]
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).map(|&c| c as usize)
    }

    /// IDF weight of `term`.
    #[must_use]
    pub fn idf_of(&self, term: &str) -> Option<f32> {
        self.column_of(term).map(|c| self.idf[c])
    }

    /// Vocabulary terms in column order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<&str> {
        // BTreeMap iteration is alphabetical, which is also column order
        self.vocabulary.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
impl TfidfVectorizer {
    /// Builds a vectorizer from raw parts without checking them.
    pub(crate) fn from_raw_parts<'a>(
        vocabulary: impl IntoIterator<Item = (&'a str, u32)>,
        idf: Vec<f32>,
    ) -> Self {
        Self {
            vocabulary: vocabulary
                .into_iter()
                .map(|(term, column)| (term.to_string(), column))
                .collect(),
            idf,
            ..Self::default()
        }
    }
}
