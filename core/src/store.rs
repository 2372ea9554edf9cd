use crate::{DocId, WordId};
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

const WORD_SEQ: &str = "word";
const DOC_SEQ: &str = "document";

/// Outcome of registering a document title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEntry {
    Created(DocId),
    /// The title was already indexed; the stored id is returned and the
    /// caller must not re-merge content for it.
    Existing(DocId),
}

/// The three persisted relations behind the index, on sled trees:
///
/// - `words` / `words_by_id`: word text <-> id, text unique, ids monotone
///   starting at 1 and never reused;
/// - `documents` / `documents_by_id`: the same for titles;
/// - `counters`: (doc id, word id) -> occurrence count;
/// - `word_docs`: (word id, doc id) membership rows, the index behind
///   per-word document-frequency scans.
///
/// Ids come from a sequence tree. A creation race can burn an id (the
/// loser's allocation is never stored), the same way database
/// autoincrement burns ids on failed inserts; `vocabulary_size` therefore
/// reports MAX(id), not the row count.
pub struct Store {
    _db: sled::Db,
    words: sled::Tree,
    words_by_id: sled::Tree,
    documents: sled::Tree,
    documents_by_id: sled::Tree,
    counters: sled::Tree,
    word_docs: sled::Tree,
    seq: sled::Tree,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            words: db.open_tree("words")?,
            words_by_id: db.open_tree("words_by_id")?,
            documents: db.open_tree("documents")?,
            documents_by_id: db.open_tree("documents_by_id")?,
            counters: db.open_tree("counters")?,
            word_docs: db.open_tree("word_docs")?,
            seq: db.open_tree("seq")?,
            _db: db,
        })
    }

    /// Return the id for a word, creating it if unseen. Safe under
    /// concurrent calls with the same text: the unique `words` row is the
    /// source of truth, and losing the insert race falls back to reading
    /// the winner's id. Single fallback, no retry loop.
    pub fn word_id_or_create(&self, name: &str) -> Result<WordId> {
        if let Some(existing) = self.words.get(name.as_bytes())? {
            return Ok(decode_u64(&existing));
        }
        let id = self.next_id(WORD_SEQ)?;
        match self
            .words
            .compare_and_swap(name.as_bytes(), None as Option<&[u8]>, Some(id.to_be_bytes().to_vec()))?
        {
            Ok(()) => {
                self.words_by_id.insert(id.to_be_bytes(), name.as_bytes())?;
                info!(word = name, id, "new word");
                Ok(id)
            }
            Err(race) => race
                .current
                .as_deref()
                .map(decode_u64)
                .ok_or_else(|| anyhow!("word {name:?} vanished during concurrent insert")),
        }
    }

    /// Return the id for a title, reporting whether this call created it.
    /// Same race handling as `word_id_or_create`.
    pub fn document_id_or_create(&self, title: &str) -> Result<DocumentEntry> {
        if let Some(existing) = self.documents.get(title.as_bytes())? {
            return Ok(DocumentEntry::Existing(decode_u64(&existing)));
        }
        let id = self.next_id(DOC_SEQ)?;
        match self
            .documents
            .compare_and_swap(title.as_bytes(), None as Option<&[u8]>, Some(id.to_be_bytes().to_vec()))?
        {
            Ok(()) => {
                self.documents_by_id.insert(id.to_be_bytes(), title.as_bytes())?;
                info!(title, id, "new document");
                Ok(DocumentEntry::Created(id))
            }
            Err(race) => race
                .current
                .as_deref()
                .map(|v| DocumentEntry::Existing(decode_u64(v)))
                .ok_or_else(|| anyhow!("document {title:?} vanished during concurrent insert")),
        }
    }

    /// Add one occurrence of `word_id` in `doc_id`. The read-modify-write
    /// is atomic, so two concurrent first occurrences cannot lose an
    /// increment. Returns the new count.
    pub fn increment_counter(&self, doc_id: DocId, word_id: WordId) -> Result<u64> {
        let key = pair_key(doc_id, word_id);
        let updated = self.counters.update_and_fetch(key, |old| {
            Some((old.map(decode_u64).unwrap_or(0) + 1).to_be_bytes().to_vec())
        })?;
        let count = updated.as_deref().map(decode_u64).unwrap_or(0);
        if count == 1 {
            // first co-occurrence: record membership for document-frequency scans
            self.word_docs.insert(pair_key(word_id, doc_id), sled::IVec::default())?;
        }
        Ok(count)
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> u64 {
        self.documents_by_id.len() as u64
    }

    /// Number of distinct words.
    pub fn word_count(&self) -> u64 {
        self.words.len() as u64
    }

    /// Dimensionality of the vector space: MAX(word id), not the word
    /// count, so every assigned id stays a valid dimension even if rows
    /// were ever removed out of band.
    pub fn vocabulary_size(&self) -> Result<u64> {
        Ok(self
            .words_by_id
            .last()?
            .map(|(key, _)| decode_u64(&key))
            .unwrap_or(0))
    }

    /// All documents as (id, title), ascending by id.
    pub fn documents(&self) -> Result<Vec<(DocId, String)>> {
        let mut out = Vec::new();
        for row in self.documents_by_id.iter() {
            let (key, value) = row?;
            out.push((decode_u64(&key), String::from_utf8_lossy(&value).into_owned()));
        }
        Ok(out)
    }

    /// All (word id, count) pairs recorded against a document.
    pub fn doc_counters(&self, doc_id: DocId) -> Result<Vec<(WordId, u64)>> {
        let mut out = Vec::new();
        for row in self.counters.scan_prefix(doc_id.to_be_bytes()) {
            let (key, value) = row?;
            out.push((decode_u64(&key[8..]), decode_u64(&value)));
        }
        Ok(out)
    }

    /// How many distinct documents contain the word at least once.
    pub fn documents_containing_word(&self, word_id: WordId) -> Result<u64> {
        let mut n = 0;
        for row in self.word_docs.scan_prefix(word_id.to_be_bytes()) {
            row?;
            n += 1;
        }
        Ok(n)
    }

    fn next_id(&self, sequence: &str) -> Result<u64> {
        let value = self.seq.update_and_fetch(sequence, |old| {
            Some((old.map(decode_u64).unwrap_or(0) + 1).to_be_bytes().to_vec())
        })?;
        value
            .as_deref()
            .map(decode_u64)
            .ok_or_else(|| anyhow!("sequence {sequence:?} vanished"))
    }
}

fn pair_key(a: u64, b: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&a.to_be_bytes());
    key[8..].copy_from_slice(&b.to_be_bytes());
    key
}

fn decode_u64(bytes: &[u8]) -> u64 {
    bytes.try_into().map(u64::from_be_bytes).unwrap_or(0)
}
