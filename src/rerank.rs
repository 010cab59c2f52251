//! Feature-based re-ranking of first-stage candidates.
//!
//! Per query term: `idf = ln(N / (df + 1))` (0 when `df == 0`), weighted by
//! `alpha * G(ritf)` where `G` is the standard (right-skewed) Gumbel CDF.
//! The document score is the sum over query-term positions.
//!
//! `beta`, `z1`, `z2` ride along in [`ScorerConfig`] but are not part of the
//! score. [`Scorer::explain`] reports `p = beta*idf / (1 + beta*idf)` per term
//! for inspection only.

use crate::analysis::whitespace_terms;
use crate::config::{Config, ScorerConfig};
use crate::engine::{CollectionStats, SearchEngine};
use crate::features::{DocumentFeatures, FeatureExtractor};
use crate::topics::Topic;
use crate::Result;

/// Gumbel (maximum) CDF: `exp(-exp(-(x - loc) / scale))`.
pub fn gumbel_cdf(x: f64, loc: f64, scale: f64) -> f64 {
    (-(-(x - loc) / scale).exp()).exp()
}

/// One term's share of a document score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermScore {
    /// `ln(N / (df + 1))`, or 0.
    pub idf: f64,
    /// Gumbel CDF of `ritf`.
    pub gumbel: f64,
    /// `alpha * gumbel`.
    pub weight: f64,
    /// `beta*idf / (1 + beta*idf)`; informational.
    pub p: f64,
    /// `weight * idf`.
    pub contribution: f64,
}

/// Stateless document scorer.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    config: ScorerConfig,
    collection_size: f64,
}

impl Scorer {
    /// Scorer over a collection of `collection_size` documents.
    pub fn new(config: ScorerConfig, collection_size: f64) -> Self {
        Self {
            config,
            collection_size,
        }
    }

    fn idf(&self, df: u32) -> f64 {
        if df == 0 {
            return 0.0;
        }
        (self.collection_size / (df as f64 + 1.0)).ln()
    }

    /// Breakdown for `term`, or `None` if the document has no features for it.
    pub fn explain(&self, term: &str, features: &DocumentFeatures) -> Option<TermScore> {
        let f = features.get(term)?;
        let idf = self.idf(f.df);
        let gumbel = gumbel_cdf(f.ritf, 0.0, 1.0);
        let weight = self.config.alpha * gumbel;
        let beta_idf = self.config.beta * idf;
        Some(TermScore {
            idf,
            gumbel,
            weight,
            p: beta_idf / (1.0 + beta_idf),
            contribution: weight * idf,
        })
    }

    /// Document score; each query-term position contributes once.
    pub fn score(&self, query_terms: &[String], features: &DocumentFeatures) -> f64 {
        query_terms
            .iter()
            .filter_map(|t| self.explain(t, features))
            .map(|s| s.contribution)
            .sum()
    }
}

/// A re-ranked document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    /// External document id.
    pub doc_id: String,
    /// Re-ranking score.
    pub score: f64,
}

/// Per-topic driver: retrieve, extract, score, sort, cut.
pub struct Reranker<'a, E: SearchEngine + ?Sized> {
    engine: &'a E,
    extractor: FeatureExtractor<'a, E>,
    scorer: Scorer,
    pool_size: usize,
    top_k: usize,
}

impl<'a, E: SearchEngine + ?Sized> Reranker<'a, E> {
    /// Build from `config`; corpus statistics come from the engine when
    /// `derive_collection_stats` is set and the engine reports them.
    pub fn new(engine: &'a E, config: &Config) -> Self {
        let stats = resolve_stats(engine, config);
        Self {
            engine,
            extractor: FeatureExtractor::new(engine, stats, config.scorer.k_param),
            scorer: Scorer::new(config.scorer, stats.collection_size),
            pool_size: config.pool_size,
            top_k: config.top_k,
        }
    }

    /// Re-ranked results for `topic`, best first, at most `top_k`.
    ///
    /// Candidates without raw text, or whose processing fails, are left out.
    /// Equal scores keep first-stage order.
    pub fn rerank(&self, topic: &Topic) -> Result<Vec<ScoredDoc>> {
        let query_terms = whitespace_terms(&topic.text);
        let hits = self.engine.search(&topic.text, self.pool_size)?;
        let candidates = hits.len();

        let mut scored = Vec::with_capacity(hits.len());
        for hit in hits {
            let features = match self.extractor.extract(&query_terms, &hit.doc_id) {
                Ok(Some(f)) => f,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(topic = %topic.id, doc_id = %hit.doc_id, error = %e, "skipping document");
                    continue;
                }
            };
            let score = self.scorer.score(&query_terms, &features);
            if tracing::enabled!(tracing::Level::TRACE) {
                for term in &query_terms {
                    if let Some(s) = self.scorer.explain(term, &features) {
                        tracing::trace!(doc_id = %hit.doc_id, term = %term, ?s, "term score");
                    }
                }
            }
            scored.push(ScoredDoc {
                doc_id: hit.doc_id,
                score,
            });
        }

        // Stable: ties keep retrieval order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_k);
        tracing::debug!(topic = %topic.id, candidates, kept = scored.len(), "reranked");
        Ok(scored)
    }
}

fn resolve_stats<E: SearchEngine + ?Sized>(engine: &E, config: &Config) -> CollectionStats {
    if config.derive_collection_stats {
        if let Some(stats) = engine.collection_stats() {
            return stats;
        }
        tracing::warn!("engine does not report collection statistics, using configured values");
    }
    config.collection
}
