//! `mvdir-search`: first-stage BM25 run over a topic file.
//!
//! Writes `bm25_results.txt` in the current directory.

use clap::error::ErrorKind;
use clap::Parser;
use mvdir::config::Config;
use mvdir::engine::LocalEngine;
use mvdir::retrieval::run_first_stage;
use mvdir::topics::parse_topics;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

const OUTPUT_FILE: &str = "bm25_results.txt";
const USAGE: &str = "Usage: mvdir-search <index_dir> <topic_file>";

#[derive(Parser, Debug)]
#[command(author, version, about = "BM25 retrieval for a topic file", long_about = None)]
struct Args {
    /// Index directory produced by `mvdir-index`.
    index_dir: PathBuf,

    /// Topic file with <num>/<title> markers.
    topic_file: PathBuf,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;
    let topics = parse_topics(&args.topic_file)?;
    let engine = LocalEngine::open(&args.index_dir, config.bm25)?;

    let out = BufWriter::new(File::create(OUTPUT_FILE)?);
    run_first_stage(&engine, &topics, &config, out)?;
    println!("BM25 results saved to {OUTPUT_FILE}");
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

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
