//! Per-(query term, document) features for re-ranking.
//!
//! Two term-frequency normalizations are computed from the document's raw text:
//! - `ritf` (relative intra-document TF): `ln(1 + tf) / ln(k + max_tf)`
//! - `lrtf` (length-regularized TF): `tf * ln(1 + avg_doc_len / doc_len)`
//!
//! The raw text is tokenized by lowercasing and splitting on whitespace, not
//! by the engine's analyzer, so `tf` is counted on exactly the query's surface
//! forms.

use crate::analysis::whitespace_terms;
use crate::engine::{CollectionStats, SearchEngine};
use crate::Result;
use std::collections::HashMap;

/// Statistics of one query term in one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermFeatures {
    /// Raw count in the document.
    pub tf: u32,
    /// Relative intra-document TF.
    pub ritf: f64,
    /// Length-regularized TF.
    pub lrtf: f64,
    /// Document frequency from the engine (1 when the lookup fails).
    pub df: u32,
}

/// Features of every query term for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFeatures {
    /// Whitespace-token count of the raw text.
    pub doc_len: usize,
    /// Largest single-term count in the document (1 for an empty token stream).
    pub max_tf: u32,
    terms: HashMap<String, TermFeatures>,
}

impl DocumentFeatures {
    /// Features for `term`, if it was part of the query.
    pub fn get(&self, term: &str) -> Option<&TermFeatures> {
        self.terms.get(term)
    }

    /// Distinct query terms covered.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when no query terms were extracted.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// `ln(1 + tf) / ln(k + max_tf)`, or 0 when `max_tf` is 0.
pub fn ritf(tf: u32, max_tf: u32, k: f64) -> f64 {
    if max_tf == 0 {
        return 0.0;
    }
    (1.0 + tf as f64).ln() / (k + max_tf as f64).ln()
}

/// `tf * ln(1 + avg_doc_len / doc_len)`, or 0 for an empty document.
pub fn lrtf(tf: u32, doc_len: usize, avg_doc_len: f64) -> f64 {
    if doc_len == 0 {
        return 0.0;
    }
    tf as f64 * (1.0 + avg_doc_len / doc_len as f64).ln()
}

/// Computes [`DocumentFeatures`] against a [`SearchEngine`].
pub struct FeatureExtractor<'a, E: SearchEngine + ?Sized> {
    engine: &'a E,
    stats: CollectionStats,
    k_param: f64,
}

impl<'a, E: SearchEngine + ?Sized> FeatureExtractor<'a, E> {
    /// Extractor using `stats` for corpus-level quantities.
    pub fn new(engine: &'a E, stats: CollectionStats, k_param: f64) -> Self {
        Self {
            engine,
            stats,
            k_param,
        }
    }

    /// Features of `query_terms` in `doc_id`.
    ///
    /// Returns `Ok(None)` when the engine has no raw text for the document, or
    /// the text is empty; such candidates are skipped by the caller.
    pub fn extract(&self, query_terms: &[String], doc_id: &str) -> Result<Option<DocumentFeatures>> {
        let Some(raw) = self.engine.raw_document(doc_id)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let tokens = whitespace_terms(&raw);
        let doc_len = tokens.len();
        let mut tf_table: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *tf_table.entry(token.as_str()).or_insert(0) += 1;
        }
        let max_tf = tf_table.values().copied().max().unwrap_or(1);

        let mut terms = HashMap::with_capacity(query_terms.len());
        for term in query_terms {
            let tf = tf_table.get(term.as_str()).copied().unwrap_or(0);
            let df = match self.engine.document_frequency(term) {
                Ok(df) => df,
                Err(e) => {
                    tracing::trace!(term = %term, error = %e, "df lookup failed, using 1");
                    1
                }
            };
            terms.insert(
                term.clone(),
                TermFeatures {
                    tf,
                    ritf: ritf(tf, max_tf, self.k_param),
                    lrtf: lrtf(tf, doc_len, self.stats.avg_doc_len),
                    df,
                },
            );
        }

        Ok(Some(DocumentFeatures {
            doc_len,
            max_tf,
            terms,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::Hit;
    use crate::Error;
    use proptest::prelude::*;

    /// In-memory engine: fixed hits, raw texts, optional df table and corpus stats.
    #[derive(Default)]
    pub(crate) struct MockEngine {
        pub hits: Vec<Hit>,
        pub raw: HashMap<String, String>,
        pub df: Option<HashMap<String, u32>>,
        pub failing: Vec<String>,
        pub stats: Option<CollectionStats>,
    }

    impl SearchEngine for MockEngine {
        fn search(&self, _query: &str, k: usize) -> Result<Vec<Hit>> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        fn raw_document(&self, doc_id: &str) -> Result<Option<String>> {
            if self.failing.iter().any(|d| d == doc_id) {
                return Err(Error::Unsupported(format!("cannot read {doc_id}")));
            }
            Ok(self.raw.get(doc_id).cloned())
        }

        fn document_frequency(&self, term: &str) -> Result<u32> {
            match &self.df {
                Some(table) => Ok(table.get(term).copied().unwrap_or(0)),
                None => Err(Error::Unsupported("df".into())),
            }
        }

        fn collection_stats(&self) -> Option<CollectionStats> {
            self.stats
        }
    }

    fn terms(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn extracts_counts_and_normalizations() {
        let mut engine = MockEngine::default();
        engine.raw.insert(
            "docA".into(),
            "Information retrieval RETRIEVAL systems design".into(),
        );
        let ex = FeatureExtractor::new(&engine, CollectionStats::default(), 1.5);
        let f = ex
            .extract(&terms("information retrieval missing"), "docA")
            .unwrap()
            .unwrap();

        assert_eq!(f.doc_len, 5);
        assert_eq!(f.max_tf, 2);
        assert_eq!(f.len(), 3);

        let r = f.get("retrieval").unwrap();
        assert_eq!(r.tf, 2);
        assert!((r.ritf - 3f64.ln() / 3.5f64.ln()).abs() < 1e-12);
        assert!((r.lrtf - 2.0 * 101f64.ln()).abs() < 1e-12);
        // Unsupported df lookups fall back to 1.
        assert_eq!(r.df, 1);

        let m = f.get("missing").unwrap();
        assert_eq!(m.tf, 0);
        assert_eq!(m.ritf, 0.0);
        assert_eq!(m.lrtf, 0.0);
    }

    #[test]
    fn missing_or_empty_raw_text_is_skipped() {
        let mut engine = MockEngine::default();
        engine.raw.insert("empty".into(), String::new());
        let ex = FeatureExtractor::new(&engine, CollectionStats::default(), 1.5);
        assert_eq!(ex.extract(&terms("a"), "empty").unwrap(), None);
        assert_eq!(ex.extract(&terms("a"), "absent").unwrap(), None);
    }

    #[test]
    fn whitespace_only_document_uses_default_max_tf() {
        let mut engine = MockEngine::default();
        engine.raw.insert("blank".into(), "   \n ".into());
        let ex = FeatureExtractor::new(&engine, CollectionStats::default(), 1.5);
        let f = ex.extract(&terms("a"), "blank").unwrap().unwrap();
        assert_eq!(f.doc_len, 0);
        assert_eq!(f.max_tf, 1);
        assert_eq!(f.get("a").unwrap().lrtf, 0.0);
    }

    #[test]
    fn engine_df_is_used_when_available() {
        let mut engine = MockEngine::default();
        engine.raw.insert("d".into(), "a b".into());
        engine.df = Some(HashMap::from([("a".to_string(), 42)]));
        let ex = FeatureExtractor::new(&engine, CollectionStats::default(), 1.5);
        let f = ex.extract(&terms("a b"), "d").unwrap().unwrap();
        assert_eq!(f.get("a").unwrap().df, 42);
        assert_eq!(f.get("b").unwrap().df, 0);
    }

    #[test]
    fn ritf_zero_max_tf_is_zero() {
        assert_eq!(ritf(0, 0, 1.5), 0.0);
        assert_eq!(ritf(3, 0, 1.5), 0.0);
    }

    proptest! {
        #[test]
        fn ritf_stays_in_unit_interval(max_tf in 1u32..10_000, frac in 0.0f64..=1.0) {
            let tf = ((max_tf as f64) * frac).floor() as u32;
            let v = ritf(tf, max_tf, 1.5);
            prop_assert!(v >= 0.0);
            prop_assert!(v <= 1.0);
        }
    }
}
