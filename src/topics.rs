//! Topic files with `<num>` / `<title>` markers (TREC / FIRE style).
//!
//! Only two markers matter. A `<num>` line sets the current topic id to the
//! digits (of any script) it contains; a `<title>` line emits a topic with the current id. All
//! other lines (`<top>`, `<desc>`, narrative text, ...) are ignored.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

const NUM: &str = "<num>";
const TITLE: &str = "<title>";

/// One information need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Numeric identifier, as a string.
    pub id: String,
    /// Free-text title used as the query.
    pub text: String,
}

/// Parse the topic file at `path`, preserving file order.
pub fn parse_topics(path: &Path) -> Result<Vec<Topic>> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })?;
    Ok(parse_topics_str(&text))
}

/// Parse topic text already in memory.
///
/// A `<title>` seen before any `<num>` is dropped. Ids are not checked for
/// uniqueness: a later `<num>` simply replaces the current id.
pub fn parse_topics_str(text: &str) -> Vec<Topic> {
    let mut topics = Vec::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with(NUM) {
            // Any script's digits: FIRE topics may number in Devanagari or Bengali.
            current = Some(line.chars().filter(|c| c.is_numeric()).collect());
        } else if let Some(rest) = line.strip_prefix(TITLE) {
            let Some(id) = &current else {
                continue;
            };
            let title = rest.trim();
            // Some topic sets close the marker on the same line; the tag is
            // never query text.
            let title = title.strip_suffix("</title>").unwrap_or(title).trim();
            topics.push(Topic {
                id: id.clone(),
                text: title.to_string(),
            });
        }
    }
    topics
}

/// One topic per id: the position of the first occurrence, the text of the last.
///
/// Run files must not repeat a `(query id, doc id)` pair, so a topic set that
/// redefines an id is reduced to its final definition.
pub fn last_title_per_id(topics: &[Topic]) -> Vec<&Topic> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<&Topic> = Vec::with_capacity(topics.len());
    for topic in topics {
        match slot.get(topic.id.as_str()) {
            Some(&i) => {
                tracing::warn!(topic = %topic.id, "repeated topic id, keeping the later title");
                out[i] = topic;
            }
            None => {
                slot.insert(topic.id.as_str(), out.len());
                out.push(topic);
            }
        }
    }
    out
}
