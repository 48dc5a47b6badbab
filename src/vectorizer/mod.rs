//! Statistical term weighting for documents.
//!
//! Turns raw text into fixed-width TF-IDF vectors. The vocabulary is learned
//! from the full corpus and capped at a configurable number of features.

mod stopwords;
mod tfidf;
mod tokenizer;

pub use stopwords::{ENGLISH_STOPWORDS, is_stopword};
pub use tfidf::TfidfVectorizer;
pub use tokenizer::tokenize;
