//! `mvdir`: BM25 first-stage retrieval plus feature-based re-ranking for ad-hoc runs.
//!
//! Pipeline:
//! - `topics` parses `<num>`/`<title>` topic files
//! - an [`engine::SearchEngine`] supplies BM25 candidates, raw document text and
//!   document frequencies (the bundled adapter is [`engine::LocalEngine`])
//! - `features` + `rerank` rescore candidates (ritf / lrtf / idf, Gumbel-CDF weighting)
//! - `run` writes the six-column run format consumed by evaluation tools
//!
//! Scope:
//! - Single-threaded batch execution, one topic at a time
//! - Deterministic output (stable sorts; retrieval order breaks score ties)
//! - Configuration is one immutable [`config::Config`] passed by reference
//!
//! Non-goals:
//! - Distributed or incremental indexing
//! - Query language beyond bag-of-terms titles
//!
//! References:
//! - Robertson & Zaragoza (2009): BM25 and beyond
//! - Paik (2013): a novel TF-IDF weighting scheme (ritf / lrtf term-frequency factors)

pub mod analysis;
pub mod bm25;
pub mod collection;
pub mod config;
pub mod engine;
pub mod features;
pub mod rerank;
pub mod retrieval;
pub mod run;
pub mod topics;

pub use error::{Error, Result};

mod error {
    use std::path::PathBuf;

    /// Errors for indexing, retrieval and re-ranking.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        /// Underlying filesystem or stream failure.
        #[error(transparent)]
        Io(#[from] std::io::Error),
        /// A text input (topic file, collection file) was not valid UTF-8.
        #[error("{path}: content is not valid UTF-8")]
        Encoding {
            /// File that failed to decode.
            path: PathBuf,
        },
        /// A JSON collection file could not be parsed.
        #[error("{path}: {source}")]
        Json {
            /// Offending file.
            path: PathBuf,
            /// Parser error.
            source: serde_json::Error,
        },
        /// Index (de)serialization failed.
        #[error("index encoding: {0}")]
        Serialize(#[from] postcard::Error),
        /// Reading or writing index files through the storage directory failed.
        #[error("index storage: {0}")]
        Storage(String),
        /// Configuration file could not be parsed.
        #[error("invalid configuration: {0}")]
        Config(#[from] toml::de::Error),
        /// The engine cannot answer this request (best-effort capability).
        #[error("unsupported: {0}")]
        Unsupported(String),
        /// Query term list was empty.
        #[error("empty query")]
        EmptyQuery,
        /// Index contains no documents.
        #[error("empty index")]
        EmptyIndex,
        /// No index file under the given directory.
        #[error("no index found at {0}")]
        IndexNotFound(PathBuf),
    }

    /// Result alias used throughout the crate.
    pub type Result<T> = std::result::Result<T, Error>;
}

/// Shared setup for the command-line programs.
#[cfg(feature = "cli")]
pub mod cli {
    use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

    /// Install a stderr `fmt` subscriber filtered by `RUST_LOG` (default `mvdir=info`).
    ///
    /// Stdout is reserved for run output.
    pub fn init_tracing() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mvdir=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
