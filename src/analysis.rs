//! Index-side text analysis.
//!
//! Approximates a standard analyzer with stemming disabled and stopwords kept:
//! lowercase, then split on anything that is not alphanumeric. Query text goes
//! through the same function so index and query tokens line up.

/// Tokenize `text` into lowercased alphanumeric runs.
pub fn analyze(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Lowercase + whitespace split, as used for re-ranking features.
///
/// Unlike [`analyze`], punctuation stays attached to the token.
pub fn whitespace_terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_splits_on_punctuation_and_lowercases() {
        assert_eq!(
            analyze("Information-Retrieval, SYSTEMS (2024)"),
            vec!["information", "retrieval", "systems", "2024"]
        );
    }

    #[test]
    fn analyze_keeps_stopwords() {
        assert_eq!(analyze("the cat and the hat"), vec!["the", "cat", "and", "the", "hat"]);
    }

    #[test]
    fn whitespace_terms_keeps_punctuation() {
        assert_eq!(whitespace_terms("Hello, World!"), vec!["hello,", "world!"]);
        assert!(whitespace_terms("   \n\t ").is_empty());
    }
}
