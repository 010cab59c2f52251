//! `mvdir-rerank`: BM25 candidates re-ranked by term-statistic features.
//!
//! Run lines go to stdout; diagnostics to stderr.

use clap::Parser;
use mvdir::config::Config;
use mvdir::engine::LocalEngine;
use mvdir::retrieval::run_reranked;
use mvdir::topics::parse_topics;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Feature-based re-ranking of BM25 candidates", long_about = None)]
struct Args {
    /// Path to index.
    index_path: PathBuf,

    /// Path to topic file.
    query_file: PathBuf,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of results kept per topic.
    #[arg(long)]
    top_k: Option<usize>,

    /// Use the index's own average length and size instead of the configured values.
    #[arg(long, default_value_t = false)]
    derive_stats: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(k) = args.top_k {
        config.top_k = k;
    }
    config.derive_collection_stats |= args.derive_stats;

    let topics = parse_topics(&args.query_file)?;
    let engine = LocalEngine::open(&args.index_path, config.bm25)?;

    let stdout = std::io::stdout();
    run_reranked(&engine, &topics, &config, BufWriter::new(stdout.lock()))?;
    Ok(())
}

fn main() -> ExitCode {
    mvdir::cli::init_tracing();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
