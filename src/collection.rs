//! Document collection readers.
//!
//! Two on-disk layouts are understood:
//! - TREC SGML: `<DOC><DOCNO>id</DOCNO> ... </DOC>` blocks, several per file
//! - JSON: `{"id": .., "contents": ..}` objects, either one per file, a JSON
//!   array, or newline-delimited
//!
//! Files ending in `.gz` are decompressed on the fly. Files are visited in
//! file-name order so repeated builds assign the same internal doc ids.

use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use walkdir::WalkDir;

/// One parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// External identifier (`DOCNO` / `id`).
    pub id: String,
    /// Text that gets analyzed into the index.
    pub contents: String,
    /// Text returned verbatim by raw-document lookups.
    pub raw: String,
}

/// Collection file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionFormat {
    /// TREC SGML documents.
    #[default]
    Trec,
    /// JSON documents with `id` and `contents`.
    Json,
}

impl FromStr for CollectionFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trec" => Ok(Self::Trec),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown collection format `{other}` (expected trec|json)")),
        }
    }
}

/// Read every document under `dir`.
pub fn read_collection(dir: &Path, format: CollectionFormat) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_hidden(path) {
            continue;
        }
        let text = read_text(path)?;
        let before = docs.len();
        match format {
            CollectionFormat::Trec => docs.extend(parse_trec(&text)),
            CollectionFormat::Json => docs.extend(parse_json(&text, path)?),
        }
        tracing::debug!(path = %path.display(), docs = docs.len() - before, "read collection file");
    }
    Ok(docs)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn read_text(path: &Path) -> Result<String> {
    let mut bytes = Vec::new();
    let file = File::open(path)?;
    if path.extension().is_some_and(|e| e == "gz") {
        GzDecoder::new(file).read_to_end(&mut bytes)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)?;
    }
    String::from_utf8(bytes).map_err(|_| Error::Encoding {
        path: path.to_path_buf(),
    })
}

/// Parse TREC SGML text into documents.
///
/// `raw` keeps the whole `<DOC>..</DOC>` block; `contents` is the block with
/// the `DOCNO` element removed and all remaining tags stripped. Blocks without
/// a `DOCNO` are skipped.
pub fn parse_trec(text: &str) -> Vec<Document> {
    const OPEN: &str = "<DOC>";
    const CLOSE: &str = "</DOC>";

    let mut docs = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        let block = &after[..end + CLOSE.len()];
        rest = &after[end + CLOSE.len()..];

        let Some((id, docno_span)) = element(block, "DOCNO") else {
            tracing::warn!("skipping <DOC> block without <DOCNO>");
            continue;
        };
        let mut body = String::with_capacity(block.len());
        body.push_str(&block[..docno_span.0]);
        body.push_str(&block[docno_span.1..]);
        docs.push(Document {
            id: id.trim().to_string(),
            contents: strip_tags(&body),
            raw: block.to_string(),
        });
    }
    docs
}

/// Inner text of `<tag>..</tag>` plus the byte span of the whole element.
fn element<'a>(block: &'a str, tag: &str) -> Option<(&'a str, (usize, usize))> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)?;
    let inner_start = start + open.len();
    let inner_len = block[inner_start..].find(&close)?;
    let end = inner_start + inner_len + close.len();
    Some((&block[inner_start..inner_start + inner_len], (start, end)))
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(serde::Deserialize)]
struct JsonDocument {
    id: String,
    #[serde(default)]
    contents: String,
}

impl From<JsonDocument> for Document {
    fn from(d: JsonDocument) -> Self {
        Self {
            id: d.id,
            raw: d.contents.clone(),
            contents: d.contents,
        }
    }
}

/// Parse a JSON collection file (object, array, or JSON lines).
pub fn parse_json(text: &str, path: &Path) -> Result<Vec<Document>> {
    let json_err = |source| Error::Json {
        path: path.to_path_buf(),
        source,
    };
    if text.trim_start().starts_with('[') {
        let docs: Vec<JsonDocument> = serde_json::from_str(text).map_err(json_err)?;
        return Ok(docs.into_iter().map(Document::from).collect());
    }
    serde_json::Deserializer::from_str(text)
        .into_iter::<JsonDocument>()
        .map(|d| d.map(Document::from).map_err(json_err))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TREC: &str = "\
<DOC>
<DOCNO> doc-1 </DOCNO>
<TEXT>
Information retrieval systems.
</TEXT>
</DOC>
<DOC>
<TEXT>no id here</TEXT>
</DOC>
<DOC>
<DOCNO>doc-2</DOCNO>
<HEADLINE>Rust</HEADLINE><TEXT>memory safety</TEXT>
</DOC>
";

    #[test]
    fn trec_blocks_parse_and_skip_missing_docno() {
        let docs = parse_trec(TREC);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "doc-1");
        assert_eq!(docs[0].contents, "Information retrieval systems.");
        assert!(docs[0].raw.starts_with("<DOC>"));
        assert!(docs[0].raw.ends_with("</DOC>"));
        assert_eq!(docs[1].id, "doc-2");
        assert_eq!(docs[1].contents, "Rust memory safety");
    }

    #[test]
    fn json_accepts_lines_and_arrays() {
        let path = Path::new("x.jsonl");
        let lines = "{\"id\":\"a\",\"contents\":\"one\"}\n{\"id\":\"b\",\"contents\":\"two\"}\n";
        let docs = parse_json(lines, path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "b");
        assert_eq!(docs[1].raw, "two");

        let array = "[{\"id\":\"c\",\"contents\":\"three\"}]";
        let docs = parse_json(array, path).unwrap();
        assert_eq!(docs[0].contents, "three");

        assert!(matches!(parse_json("{\"id\":", path), Err(Error::Json { .. })));
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("TREC".parse::<CollectionFormat>(), Ok(CollectionFormat::Trec));
        assert_eq!("jsonl".parse::<CollectionFormat>(), Ok(CollectionFormat::Json));
        assert!("xml".parse::<CollectionFormat>().is_err());
    }

    #[test]
    fn read_collection_walks_directory_in_name_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            tmp.path().join("b.txt"),
            "<DOC><DOCNO>B1</DOCNO>beta</DOC>",
        )
        .unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(
            tmp.path().join("sub").join("c.txt"),
            "<DOC><DOCNO>C1</DOCNO>gamma</DOC>",
        )
        .unwrap();
        let gz = File::create(tmp.path().join("a.gz")).unwrap();
        let mut enc = flate2::write::GzEncoder::new(gz, flate2::Compression::default());
        enc.write_all(b"<DOC><DOCNO>A1</DOCNO>alpha</DOC>").unwrap();
        enc.finish().unwrap();

        let docs = read_collection(tmp.path(), CollectionFormat::Trec).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "B1", "C1"]);
    }

    #[test]
    fn read_collection_rejects_invalid_utf8() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_collection(tmp.path(), CollectionFormat::Trec),
            Err(Error::Encoding { .. })
        ));
    }
}
