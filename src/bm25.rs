//! Okapi BM25 over `postings::PostingsIndex`.
//!
//! This is the first-stage scorer behind [`crate::engine::LocalEngine`]:
//! - candidate generation comes from `postings` (with bailout support)
//! - scoring is standard BM25 with the "+1" IDF (always positive)
//! - ranking is deterministic (score desc, then doc_id asc)
//!
//! References:
//! - Robertson & Walker (1994). "Some simple effective approximations to the 2-Poisson model..."
//! - Robertson & Zaragoza (2009). "The Probabilistic Relevance Framework: BM25 and Beyond."

use crate::Error;
use postings::{CandidatePlan, PlannerConfig, PostingsIndex};
use rankfns::{bm25_idf_plus1, bm25_tf, Retriever};
use serde::{Deserialize, Serialize};

impl Retriever for InvertedIndex {
    type Query = [String];
    type DocId = u32;

    fn retrieve(
        &self,
        query: &Self::Query,
        k: usize,
    ) -> Result<Vec<(Self::DocId, f32)>, Box<dyn std::error::Error>> {
        Ok(self.retrieve(query, k, Bm25Params::default())?)
    }
}

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter.
    pub k1: f32,
    /// Length normalization parameter.
    pub b: f32,
}

impl Default for Bm25Params {
    /// `k1 = 0.9`, `b = 0.4`: the usual ad-hoc baseline setting for news collections.
    fn default() -> Self {
        Self { k1: 0.9, b: 0.4 }
    }
}

/// Inverted index for BM25 retrieval.
///
/// Document ids are dense and assigned in insertion order.
#[derive(Debug)]
pub struct InvertedIndex {
    postings: PostingsIndex<String>,
    next_doc_id: u32,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InvertedIndex {
    /// Create a new empty BM25 index.
    pub fn new() -> Self {
        Self::from_postings(PostingsIndex::new())
    }

    /// Create a BM25 index from an existing postings index.
    pub fn from_postings(postings: PostingsIndex<String>) -> Self {
        let next_doc_id = postings.document_ids().max().map_or(0, |id| id + 1);
        Self {
            postings,
            next_doc_id,
        }
    }

    /// Save the index using `durability` (crash-safe atomic write).
    pub fn save<D: durability::Directory + ?Sized>(
        &self,
        dir: &D,
        path: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.postings.save(dir, path)
    }

    /// Load an index using `durability`.
    pub fn load<D: durability::Directory + ?Sized>(
        dir: &D,
        path: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let postings = PostingsIndex::<String>::load(dir, path)?;
        Ok(Self::from_postings(postings))
    }

    /// Count of documents currently indexed.
    pub fn num_docs(&self) -> u32 {
        self.postings.num_docs()
    }

    /// Iterate document ids.
    pub fn document_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.postings.document_ids()
    }

    /// Append a document's token stream; returns its doc id.
    pub fn add_document(&mut self, terms: &[String]) -> u32 {
        let doc_id = self.next_doc_id;
        let _ = self.postings.add_document(doc_id, terms);
        self.next_doc_id += 1;
        doc_id
    }

    /// Term frequency of `term` in `doc_id` (0 if doc missing / term absent).
    pub fn term_frequency(&self, doc_id: u32, term: &str) -> u32 {
        self.postings.term_frequency(doc_id, term)
    }

    /// Document frequency of `term`.
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.postings.df(term)
    }

    /// Document length (in terms). Returns 0 for unknown doc ids.
    pub fn document_length(&self, doc_id: u32) -> u32 {
        self.postings.document_len(doc_id)
    }

    /// Average document length (in terms).
    pub fn avg_doc_len(&self) -> f32 {
        self.postings.avg_doc_len()
    }

    /// Number of distinct terms.
    pub fn num_terms(&self) -> usize {
        self.postings.terms().count()
    }

    /// Candidate documents: docs that contain at least one query term, with bailout.
    pub fn candidates(&self, query_terms: &[String]) -> Vec<u32> {
        match self
            .postings
            .plan_candidates(query_terms, PlannerConfig::default())
        {
            CandidatePlan::Candidates(c) => c,
            CandidatePlan::ScanAll => {
                let mut v: Vec<u32> = self.document_ids().collect();
                v.sort_unstable();
                v
            }
        }
    }

    /// IDF with BM25 "+1" variant (positive idf, stable for frequent terms).
    pub fn idf(&self, term: &str) -> f32 {
        let df = self.postings.df(term);
        if df == 0 {
            return 0.0;
        }
        bm25_idf_plus1(self.num_docs(), df as u32)
    }

    /// Retrieve top-k documents using BM25 scoring.
    ///
    /// - **Input**: analyzed query terms; a repeated term contributes once per occurrence.
    /// - **Output**: sorted deterministically by `(score desc, doc_id asc)`.
    pub fn retrieve(
        &self,
        query_terms: &[String],
        k: usize,
        params: Bm25Params,
    ) -> Result<Vec<(u32, f32)>, Error> {
        if query_terms.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if self.num_docs() == 0 {
            return Err(Error::EmptyIndex);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_idfs: Vec<f32> = query_terms.iter().map(|t| self.idf(t)).collect();
        let candidates = self.candidates(query_terms);

        // Min-heap top-k.
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        #[derive(PartialEq)]
        struct FloatOrd(f32);
        impl Eq for FloatOrd {}
        impl PartialOrd for FloatOrd {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for FloatOrd {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        // Reverse doc id inside the heap key so that, among equal scores, the
        // larger doc id is evicted first.
        let mut heap: BinaryHeap<Reverse<(FloatOrd, Reverse<u32>)>> =
            BinaryHeap::with_capacity(k + 1);
        for doc_id in candidates {
            let score = score_with_idfs(self, doc_id, query_terms, &query_idfs, params);
            if !score.is_finite() || score <= 0.0 {
                continue;
            }
            heap.push(Reverse((FloatOrd(score), Reverse(doc_id))));
            if heap.len() > k {
                heap.pop();
            }
        }

        let mut results: Vec<(u32, f32)> = heap
            .into_iter()
            .map(|Reverse((FloatOrd(score), Reverse(doc_id)))| (doc_id, score))
            .collect();

        // Deterministic: score desc, then doc_id asc.
        results.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(results)
    }
}

fn score_with_idfs(
    index: &InvertedIndex,
    doc_id: u32,
    query_terms: &[String],
    query_idfs: &[f32],
    params: Bm25Params,
) -> f32 {
    let avg_doc_len = index.avg_doc_len();
    if avg_doc_len == 0.0 {
        return 0.0;
    }
    let doc_length = index.document_length(doc_id) as f32;
    let mut score = 0.0;
    for (term, &idf) in query_terms.iter().zip(query_idfs.iter()) {
        if idf == 0.0 {
            continue;
        }
        let tf = index.term_frequency(doc_id, term) as f32;
        if tf == 0.0 {
            continue;
        }
        score += idf * bm25_tf(tf, doc_length, avg_doc_len, params.k1, params.b);
    }
    score
}
