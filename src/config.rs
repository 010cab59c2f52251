//! Run configuration.
//!
//! One immutable [`Config`] is built at startup (defaults, optionally overlaid
//! by a TOML file) and passed by reference to every stage. Any field missing
//! from the file keeps its default.

use crate::bm25::Bm25Params;
use crate::engine::CollectionStats;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Re-ranking scorer constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Multiplier on the Gumbel-CDF weight.
    pub alpha: f64,
    /// Saturation constant for the per-term probability reported by
    /// [`crate::rerank::Scorer::explain`]. Does not enter the score.
    pub beta: f64,
    /// Offset in the ritf denominator, `ln(k_param + max_tf)`.
    pub k_param: f64,
    /// Reserved. Not read by the scorer.
    pub z1: f64,
    /// Reserved. Not read by the scorer.
    pub z2: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 1.5,
            k_param: 1.5,
            z1: 2.5,
            z2: 0.04,
        }
    }
}

/// Everything the index / search / rerank programs can tune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First-stage BM25 parameters.
    pub bm25: Bm25Params,
    /// Candidates requested from the engine per topic.
    pub pool_size: usize,
    /// Re-ranked results emitted per topic.
    pub top_k: usize,
    /// Scorer constants.
    pub scorer: ScorerConfig,
    /// Fallback corpus statistics for the re-ranking features.
    pub collection: CollectionStats,
    /// Prefer the engine's own corpus statistics over `collection` when available.
    pub derive_collection_stats: bool,
    /// Last column of every run line.
    pub run_tag: String,
    /// Decimal places for first-stage scores.
    pub bm25_precision: usize,
    /// Decimal places for re-ranked scores.
    pub rerank_precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            pool_size: 2000,
            top_k: 1000,
            scorer: ScorerConfig::default(),
            collection: CollectionStats::default(),
            derive_collection_stats: false,
            run_tag: "mvdir".to_string(),
            bm25_precision: 4,
            rerank_precision: 6,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Defaults, or the file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}
