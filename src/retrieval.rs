//! Whole-run drivers: every topic in file order, one run file out.

use crate::config::Config;
use crate::engine::SearchEngine;
use crate::rerank::Reranker;
use crate::run::RunWriter;
use crate::topics::{last_title_per_id, Topic};
use crate::Result;
use std::io::Write;

/// First-stage BM25 run: up to `pool_size` hits per topic, scores to
/// `bm25_precision` decimals.
///
/// A topic id that occurs more than once is searched once, with its last title.
pub fn run_first_stage<E, W>(engine: &E, topics: &[Topic], config: &Config, out: W) -> Result<W>
where
    E: SearchEngine + ?Sized,
    W: Write,
{
    let mut writer = RunWriter::new(out, config.run_tag.as_str(), config.bm25_precision);
    let topics = last_title_per_id(topics);
    for topic in &topics {
        let hits = engine.search(&topic.text, config.pool_size)?;
        let n = writer.write_ranking(
            &topic.id,
            hits.iter().map(|h| (h.doc_id.as_str(), h.score as f64)),
        )?;
        tracing::debug!(topic = %topic.id, hits = n, "first stage");
    }
    tracing::info!(topics = topics.len(), lines = writer.lines_written(), "first-stage run complete");
    writer.finish()
}

/// Re-ranked run: up to `top_k` documents per topic, scores to
/// `rerank_precision` decimals.
pub fn run_reranked<E, W>(engine: &E, topics: &[Topic], config: &Config, out: W) -> Result<W>
where
    E: SearchEngine + ?Sized,
    W: Write,
{
    let reranker = Reranker::new(engine, config);
    let mut writer = RunWriter::new(out, config.run_tag.as_str(), config.rerank_precision);
    for topic in topics {
        let ranked = reranker.rerank(topic)?;
        writer.write_ranking(&topic.id, ranked.iter().map(|d| (d.doc_id.as_str(), d.score)))?;
    }
    tracing::info!(topics = topics.len(), lines = writer.lines_written(), "re-ranked run complete");
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Hit;
    use crate::features::tests::MockEngine;
    use crate::topics::parse_topics_str;

    fn engine() -> MockEngine {
        let mut engine = MockEngine::default();
        engine.hits = vec![
            Hit { doc_id: "docA".into(), score: 5.0 },
            Hit { doc_id: "docB".into(), score: 3.0 },
        ];
        engine.raw.insert(
            "docA".into(),
            "information retrieval retrieval systems design".into(),
        );
        engine
    }

    #[test]
    fn end_to_end_rerank_skips_unretrievable_document() {
        let topics = parse_topics_str("<num> : 1\n<title> information retrieval systems\n");
        let out = run_reranked(&engine(), &topics, &Config::default(), Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let cols: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(cols[..4], ["1", "Q0", "docA", "1"]);
        assert_eq!(cols[4].split('.').nth(1).map(str::len), Some(6));
        assert_eq!(cols[5], "mvdir");
        assert!(!text.contains("docB"));
    }

    #[test]
    fn first_stage_writes_every_hit_with_four_decimals() {
        let topics = parse_topics_str("<num> 3\n<title> q\n<num> 4\n<title> r\n");
        let out = run_first_stage(&engine(), &topics, &Config::default(), Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "3\tQ0\tdocA\t1\t5.0000\tmvdir\n\
             3\tQ0\tdocB\t2\t3.0000\tmvdir\n\
             4\tQ0\tdocA\t1\t5.0000\tmvdir\n\
             4\tQ0\tdocB\t2\t3.0000\tmvdir\n"
        );
    }

    #[test]
    fn first_stage_searches_a_repeated_topic_id_once_with_its_last_title() {
        use crate::bm25::Bm25Params;
        use crate::collection::Document;
        use crate::engine::LocalEngine;

        let doc = |id: &str, text: &str| Document {
            id: id.into(),
            contents: text.into(),
            raw: text.into(),
        };
        let engine = LocalEngine::build(
            vec![doc("d1", "monsoon flood relief"), doc("d2", "cricket world cup")],
            Bm25Params::default(),
        );
        let topics = parse_topics_str("<num> 9\n<title> flood\n<num> 9\n<title> cricket\n");
        let out = run_first_stage(&engine, &topics, &Config::default(), Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("9\tQ0\td2\t1\t"));
    }
}
