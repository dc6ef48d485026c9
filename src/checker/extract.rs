// src/checker/extract.rs
// =============================================================================
// This module pulls content out of a response body with a regular expression.
//
// Rules:
// - Every non-overlapping match is collected, in order of occurrence
// - Matches are joined with '\n'
// - Empty matches are skipped, so a pattern that matches nothing (or only
//   the empty string) yields "" rather than a run of newlines
// =============================================================================

use regex::Regex;

// Extracts all matches of `pattern` from `body`
//
// Example:
//   pattern "find me", body "find me plz ... find me if you can"
//   -> "find me\nfind me"
pub fn extract_matches(pattern: &Regex, body: &str) -> String {
    pattern
        .find_iter(body)
        .map(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"
        <!DOCTYPE html>
        <html>
        <body>
        <h1>find me plz</h1>
        <p>hehehe find me if you can!</p>
        <p>123</p>
        <p>12</p>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_repeated_match() {
        let pattern = Regex::new("find me").unwrap();
        assert_eq!(extract_matches(&pattern, BODY), "find me\nfind me");
    }

    #[test]
    fn test_extract_single_match() {
        let pattern = Regex::new("123").unwrap();
        assert_eq!(extract_matches(&pattern, BODY), "123");
    }

    #[test]
    fn test_extract_no_match() {
        let pattern = Regex::new("no match").unwrap();
        assert_eq!(extract_matches(&pattern, BODY), "");
    }

    #[test]
    fn test_extract_empty_pattern() {
        let pattern = Regex::new("").unwrap();
        assert_eq!(extract_matches(&pattern, BODY), "");
    }

    #[test]
    fn test_extract_keeps_order() {
        let pattern = Regex::new(r"<p>\d+</p>").unwrap();
        assert_eq!(extract_matches(&pattern, BODY), "<p>123</p>\n<p>12</p>");
    }
}
