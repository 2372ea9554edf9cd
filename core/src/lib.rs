//! Online TF-IDF document index with pairwise cosine "sibling" ranking.
//!
//! Every ingested document is tokenized into a persistent
//! vocabulary/frequency store. Each ingestion then rebuilds the TF-IDF
//! vector of every known document and ranks, per document, all others by
//! cosine similarity. Vectors and rankings are derived state: they are
//! recomputed whole on every update, never patched.

pub mod engine;
pub mod similarity;
pub mod store;
pub mod tokenizer;
pub mod vectorizer;

pub use engine::Engine;
pub use store::Store;
pub use vectorizer::SparseVector;

use serde::Serialize;

pub type WordId = u64;
pub type DocId = u64;

/// A corpus document with its derived vector and sibling ranking.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub vector: SparseVector,
    /// Other documents ranked by similarity, descending. Only strictly
    /// positive similarities are listed; the relation is symmetric.
    pub siblings: Vec<Sibling>,
}

/// A related document and its cosine similarity, always in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sibling {
    pub id: DocId,
    pub similarity: f64,
}
