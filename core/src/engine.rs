use crate::similarity::compute_siblings;
use crate::store::{DocumentEntry, Store};
use crate::tokenizer::tokenize;
use crate::vectorizer::build_vector;
use crate::{DocId, Document};
use anyhow::Result;
use std::path::Path;
use tracing::{error, warn};

/// Update orchestrator: one `ingest` call counts a document's tokens into
/// the store, then rebuilds vectors and sibling rankings for the whole
/// corpus. There is no incremental similarity update.
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self { store: Store::open(path)? })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Ingest one document and return the fully recomputed corpus.
    ///
    /// A title that already exists is ignored: the new content is not
    /// tokenized and the stored counters stay as they were. A storage
    /// failure on a single token skips that token; a failure to register
    /// the document skips tokenization. Either way the corpus is still
    /// recomputed, so the response always reflects current global state.
    pub fn ingest(&self, title: &str, content: &str) -> Result<Vec<Document>> {
        match self.store.document_id_or_create(title) {
            Ok(DocumentEntry::Created(doc_id)) => {
                for token in tokenize(content) {
                    self.count_token(doc_id, &token);
                }
            }
            Ok(DocumentEntry::Existing(_)) => {
                warn!(title, "document already indexed, content ignored");
            }
            Err(err) => {
                error!(title, error = %err, "failed to register document, content ignored");
            }
        }
        self.corpus()
    }

    fn count_token(&self, doc_id: DocId, token: &str) {
        let word_id = match self.store.word_id_or_create(token) {
            Ok(id) => id,
            Err(err) => {
                error!(token, error = %err, "failed to register word, token skipped");
                return;
            }
        };
        if let Err(err) = self.store.increment_counter(doc_id, word_id) {
            error!(token, error = %err, "failed to count token");
        }
    }

    /// Rebuild every document's vector from current counters, then rank
    /// siblings over the full pairwise matrix.
    ///
    /// The statistics reads are plain independent reads, not a snapshot:
    /// a concurrently in-flight ingestion may be partially visible here.
    /// Accepted relaxation; do not paper over it with a global lock.
    pub fn corpus(&self) -> Result<Vec<Document>> {
        let document_count = self.store.document_count();
        let vocabulary_size = self.store.vocabulary_size()?;
        let mut documents = Vec::new();
        for (id, title) in self.store.documents()? {
            let vector = build_vector(&self.store, id, vocabulary_size, document_count)?;
            documents.push(Document {
                id,
                title,
                vector,
                siblings: Vec::new(),
            });
        }
        compute_siblings(&mut documents);
        Ok(documents)
    }
}
