//! Six-column run files: `qid Q0 docid rank score tag`, tab separated.
//!
//! Column order and count are fixed; evaluation tools split on whitespace and
//! read the columns positionally.

use crate::Result;
use std::io::Write;

/// Format a single run line (no trailing newline).
pub fn format_run_line(
    query_id: &str,
    doc_id: &str,
    rank: usize,
    score: f64,
    precision: usize,
    run_tag: &str,
) -> String {
    format!("{query_id}\tQ0\t{doc_id}\t{rank}\t{score:.precision$}\t{run_tag}")
}

/// Writes ranked lists for successive topics to one sink.
pub struct RunWriter<W: Write> {
    out: W,
    run_tag: String,
    precision: usize,
    lines: usize,
}

impl<W: Write> RunWriter<W> {
    /// Writer tagging every line with `run_tag`, scores to `precision` decimals.
    pub fn new(out: W, run_tag: impl Into<String>, precision: usize) -> Self {
        Self {
            out,
            run_tag: run_tag.into(),
            precision,
            lines: 0,
        }
    }

    /// Write one topic's ranking; `ranking` must already be best-first.
    ///
    /// Ranks are assigned 1..=N in the given order.
    pub fn write_ranking<I, S>(&mut self, query_id: &str, ranking: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut written = 0;
        for (i, (doc_id, score)) in ranking.into_iter().enumerate() {
            let line = format_run_line(
                query_id,
                doc_id.as_ref(),
                i + 1,
                score,
                self.precision,
                &self.run_tag,
            );
            writeln!(self.out, "{line}")?;
            written += 1;
        }
        self.lines += written;
        Ok(written)
    }

    /// Total lines written so far.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
