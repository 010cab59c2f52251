//! Search-engine capability interface and the bundled local adapter.
//!
//! Re-ranking only needs three things from an engine: ranked candidates, the
//! raw text of a candidate, and (best effort) a term's document frequency.
//! [`SearchEngine`] is that contract; [`LocalEngine`] implements it over the
//! in-crate BM25 index and persists to two files in an index directory.

use crate::analysis::analyze;
use crate::bm25::{Bm25Params, InvertedIndex};
use crate::collection::Document;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use durability::Directory;
use std::io::Read;
use std::path::Path;

/// File name of the serialized postings inside an index directory.
pub const INDEX_FILE: &str = "index.bin";

/// File name of the document store (external ids, raw text) inside an index directory.
pub const DOCS_FILE: &str = "docs.bin";

/// One first-stage result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// External document id.
    pub doc_id: String,
    /// Engine relevance score.
    pub score: f32,
}

/// Corpus-level statistics used by the re-ranking features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionStats {
    /// Mean document length in tokens.
    pub avg_doc_len: f64,
    /// Number of documents.
    pub collection_size: f64,
}

impl Default for CollectionStats {
    fn default() -> Self {
        Self {
            avg_doc_len: 500.0,
            collection_size: 1_000_000.0,
        }
    }
}

/// What the re-ranking pipeline needs from a search engine.
pub trait SearchEngine {
    /// Top `k` documents for free-text `query`, best first.
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>>;

    /// Stored raw text of `doc_id`; `None` if the engine has no such document.
    fn raw_document(&self, doc_id: &str) -> Result<Option<String>>;

    /// Number of documents containing `term`.
    ///
    /// Best effort: engines may return [`Error::Unsupported`].
    fn document_frequency(&self, term: &str) -> Result<u32>;

    /// True corpus statistics, when the engine can report them.
    fn collection_stats(&self) -> Option<CollectionStats> {
        None
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocStore {
    doc_ids: Vec<String>,
    raw: Vec<String>,
}

/// BM25 engine over the in-crate inverted index.
#[derive(Debug)]
pub struct LocalEngine {
    index: InvertedIndex,
    docs: DocStore,
    by_id: HashMap<String, u32>,
    params: Bm25Params,
}

fn storage_err(e: impl std::fmt::Display) -> Error {
    Error::Storage(e.to_string())
}

impl LocalEngine {
    /// Index `documents` in order. Later duplicates of an id are skipped.
    pub fn build<I>(documents: I, params: Bm25Params) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut index = InvertedIndex::new();
        let mut docs = DocStore::default();
        let mut by_id = HashMap::new();
        for doc in documents {
            if by_id.contains_key(&doc.id) {
                tracing::warn!(doc_id = %doc.id, "duplicate document id, keeping first");
                continue;
            }
            let internal = index.add_document(&analyze(&doc.contents));
            by_id.insert(doc.id.clone(), internal);
            docs.doc_ids.push(doc.id);
            docs.raw.push(doc.raw);
        }
        Self {
            index,
            docs,
            by_id,
            params,
        }
    }

    /// Number of indexed documents.
    pub fn num_docs(&self) -> u32 {
        self.index.num_docs()
    }

    /// Number of distinct index terms.
    pub fn num_terms(&self) -> usize {
        self.index.num_terms()
    }

    /// Write the index to `dir`, creating `dir` if needed.
    ///
    /// Postings go to `index.bin`, document ids and raw text to `docs.bin`;
    /// both are written atomically through `durability`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let fs = durability::FsDirectory::new(dir).map_err(storage_err)?;
        let bytes = postcard::to_allocvec(&self.docs)?;
        fs.atomic_write(DOCS_FILE, &bytes).map_err(storage_err)?;
        self.index.save(&fs, INDEX_FILE).map_err(storage_err)?;
        Ok(())
    }

    /// Load an index previously written by [`LocalEngine::save`].
    pub fn open(dir: &Path, params: Bm25Params) -> Result<Self> {
        if !dir.join(INDEX_FILE).is_file() || !dir.join(DOCS_FILE).is_file() {
            return Err(Error::IndexNotFound(dir.to_path_buf()));
        }
        let fs = durability::FsDirectory::new(dir).map_err(storage_err)?;
        let index = InvertedIndex::load(&fs, INDEX_FILE).map_err(storage_err)?;

        let mut f = fs.open_file(DOCS_FILE).map_err(storage_err)?;
        let mut bytes = Vec::new();
        f.read_to_end(&mut bytes)?;
        let docs: DocStore = postcard::from_bytes(&bytes)?;

        let by_id = docs
            .doc_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();
        Ok(Self {
            index,
            docs,
            by_id,
            params,
        })
    }
}

impl SearchEngine for LocalEngine {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        let hits = match self.index.retrieve(&analyze(query), k, self.params) {
            Ok(hits) => hits,
            Err(Error::EmptyQuery | Error::EmptyIndex) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(hits
            .into_iter()
            .filter_map(|(internal, score)| {
                let doc_id = self.docs.doc_ids.get(internal as usize)?.clone();
                Some(Hit { doc_id, score })
            })
            .collect())
    }

    fn raw_document(&self, doc_id: &str) -> Result<Option<String>> {
        Ok(self
            .by_id
            .get(doc_id)
            .and_then(|&i| self.docs.raw.get(i as usize).cloned()))
    }

    fn document_frequency(&self, term: &str) -> Result<u32> {
        match analyze(term).as_slice() {
            [token] => Ok(self.index.doc_frequency(token)),
            _ => Err(Error::Unsupported(format!(
                "`{term}` does not analyze to a single index term"
            ))),
        }
    }

    fn collection_stats(&self) -> Option<CollectionStats> {
        if self.num_docs() == 0 {
            return None;
        }
        Some(CollectionStats {
            avg_doc_len: self.index.avg_doc_len() as f64,
            collection_size: self.num_docs() as f64,
        })
    }
}
