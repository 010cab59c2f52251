//! `mvdir-index`: build a BM25 index directory from a document collection.

use clap::error::ErrorKind;
use clap::Parser;
use mvdir::collection::{read_collection, CollectionFormat};
use mvdir::config::Config;
use mvdir::engine::LocalEngine;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: mvdir-index <input_dir> <index_dir>";

#[derive(Parser, Debug)]
#[command(author, version, about = "Index a document collection for BM25 retrieval", long_about = None)]
struct Args {
    /// Directory of collection files (searched recursively).
    input_dir: PathBuf,

    /// Directory to write the index into (created if missing).
    index_dir: PathBuf,

    /// Collection layout: `trec` (<DOC>/<DOCNO> SGML) or `json` ({"id","contents"}).
    #[arg(long, default_value = "trec")]
    collection: CollectionFormat,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;
    println!("Indexing documents from {}...", args.input_dir.display());
    let docs = read_collection(&args.input_dir, args.collection)?;
    let engine = LocalEngine::build(docs, config.bm25);
    engine.save(&args.index_dir)?;
    tracing::info!(
        docs = engine.num_docs(),
        terms = engine.num_terms(),
        "index written"
    );
    println!(
        "Indexed {} documents to {}",
        engine.num_docs(),
        args.index_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    mvdir::cli::init_tracing();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if !args.input_dir.exists() {
        eprintln!(
            "Error: Input directory {} does not exist.",
            args.input_dir.display()
        );
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
