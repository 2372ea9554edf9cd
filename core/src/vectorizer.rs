use crate::store::Store;
use crate::DocId;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Sparse map from 0-based dimension to nonzero weight. Absent dimensions
/// are implicitly zero.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SparseVector {
    dims: usize,
    weights: HashMap<usize, f64>,
}

impl SparseVector {
    pub fn new(dims: usize) -> Self {
        Self { dims, weights: HashMap::new() }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn set(&mut self, dim: usize, weight: f64) {
        if weight != 0.0 {
            self.weights.insert(dim, weight);
        }
    }

    pub fn get(&self, dim: usize) -> f64 {
        self.weights.get(&dim).copied().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        // iterate the smaller map, probe the larger
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .map(|(dim, weight)| weight * large.get(*dim))
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }
}

/// Build one document's TF-IDF vector from the current corpus statistics.
///
/// `tf` is the word's count divided by the document's total token count
/// (pure relative frequency, no dampening). `idf` is
/// `1 + ln(document_count / documents_containing_word)`, with the
/// containing-document count taken from the counter rows, never cached.
/// Word id N owns dimension N-1. A document whose counters sum to zero
/// gets an all-zero vector of full dimensionality.
pub fn build_vector(
    store: &Store,
    doc_id: DocId,
    vocabulary_size: u64,
    document_count: u64,
) -> Result<SparseVector> {
    let mut vector = SparseVector::new(vocabulary_size as usize);
    let counts = store.doc_counters(doc_id)?;
    let doc_size: u64 = counts.iter().map(|(_, count)| count).sum();
    if doc_size == 0 {
        return Ok(vector);
    }
    for (word_id, count) in counts {
        let tf = count as f64 / doc_size as f64;
        // a counter row implies at least one containing document; the
        // floor only matters against a concurrently in-flight ingestion
        let df = store.documents_containing_word(word_id)?.max(1);
        let idf = 1.0 + (document_count as f64 / df as f64).ln();
        vector.set(word_id as usize - 1, tf * idf);
    }
    Ok(vector)
}
