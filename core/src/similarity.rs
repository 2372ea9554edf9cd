use crate::vectorizer::SparseVector;
use crate::{Document, Sibling};
use std::cmp::Ordering;
use tracing::debug;

/// Cosine similarity of two sparse vectors, defined as exactly 0 when
/// either norm is 0. A zero vector is therefore similarity-0 to
/// everything, including itself.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        0.0
    } else {
        a.dot(b) / denom
    }
}

/// Rank every document's siblings from the pairwise similarity matrix.
///
/// The matrix is symmetric, so only the lower triangle (j < i) is
/// evaluated: n*(n-1)/2 pairs instead of n*n. Each pair with positive
/// similarity is appended to both documents' builders with the identical
/// value, which mirrors the computed half into full adjacency. Lists are
/// sorted by similarity descending at the end; ties keep insertion order
/// (the sort is stable) but no caller may rely on that.
pub fn compute_siblings(documents: &mut [Document]) {
    let mut lists: Vec<Vec<Sibling>> = vec![Vec::new(); documents.len()];
    for i in 0..documents.len() {
        for j in 0..i {
            let similarity = cosine_similarity(&documents[i].vector, &documents[j].vector);
            debug!(
                a = %documents[i].title,
                b = %documents[j].title,
                similarity,
                "computed pair"
            );
            if similarity > 0.0 {
                lists[i].push(Sibling { id: documents[j].id, similarity });
                lists[j].push(Sibling { id: documents[i].id, similarity });
            }
        }
    }
    for (document, mut siblings) in documents.iter_mut().zip(lists) {
        siblings.sort_by(|s1, s2| {
            s2.similarity
                .partial_cmp(&s1.similarity)
                .unwrap_or(Ordering::Equal)
        });
        document.siblings = siblings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, dims: usize, weights: &[(usize, f64)]) -> Document {
        let mut vector = SparseVector::new(dims);
        for &(dim, w) in weights {
            vector.set(dim, w);
        }
        Document {
            id,
            title: format!("doc-{id}"),
            vector,
            siblings: Vec::new(),
        }
    }

    #[test]
    fn cosine_is_zero_for_zero_norm() {
        let zero = SparseVector::new(3);
        let mut unit = SparseVector::new(3);
        unit.set(0, 1.0);
        assert_eq!(cosine_similarity(&zero, &unit), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn cosine_of_identical_direction_is_one() {
        let mut a = SparseVector::new(2);
        a.set(0, 2.0);
        let mut b = SparseVector::new(2);
        b.set(0, 5.0);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn positive_pairs_are_mirrored_with_equal_similarity() {
        let mut docs = vec![
            doc(1, 3, &[(0, 1.0), (1, 1.0)]),
            doc(2, 3, &[(1, 1.0), (2, 1.0)]),
            doc(3, 3, &[(2, 1.0)]),
        ];
        compute_siblings(&mut docs);
        let sim_12 = docs[0].siblings.iter().find(|s| s.id == 2).unwrap().similarity;
        let sim_21 = docs[1].siblings.iter().find(|s| s.id == 1).unwrap().similarity;
        assert_eq!(sim_12, sim_21);
        assert!(sim_12 > 0.0);
        // docs 1 and 3 share no dimension
        assert!(docs[0].siblings.iter().all(|s| s.id != 3));
        assert!(docs[2].siblings.iter().all(|s| s.id != 1));
    }

    #[test]
    fn sibling_lists_are_sorted_descending() {
        let mut docs = vec![
            doc(1, 4, &[(0, 1.0), (1, 1.0), (2, 1.0)]),
            doc(2, 4, &[(0, 1.0)]),
            doc(3, 4, &[(0, 1.0), (1, 1.0)]),
        ];
        compute_siblings(&mut docs);
        let sims: Vec<f64> = docs[0].siblings.iter().map(|s| s.similarity).collect();
        assert_eq!(sims.len(), 2);
        assert!(sims.windows(2).all(|w| w[0] >= w[1]));
        assert!(sims.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn zero_vector_document_ends_up_everywhere_absent() {
        let mut docs = vec![
            doc(1, 2, &[(0, 1.0)]),
            doc(2, 2, &[]),
            doc(3, 2, &[(0, 2.0)]),
        ];
        compute_siblings(&mut docs);
        assert!(docs[1].siblings.is_empty());
        assert!(docs[0].siblings.iter().all(|s| s.id != 2));
        assert!(docs[2].siblings.iter().all(|s| s.id != 2));
    }

    #[test]
    fn singleton_corpus_has_no_siblings() {
        let mut docs = vec![doc(1, 1, &[(0, 1.0)])];
        compute_siblings(&mut docs);
        assert!(docs[0].siblings.is_empty());
    }
}
