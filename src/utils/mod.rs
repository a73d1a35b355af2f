//! Utility functions and helpers.

pub mod cookie;
pub mod http;
pub mod url;

use std::sync::LazyLock;

use regex::Regex;

static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid forbidden-character pattern"));

/// Make text safe for use as a file or directory name.
///
/// Characters that are invalid in file names become spaces, then whitespace
/// runs collapse to a single space.
pub fn sanitize(text: &str) -> String {
    collapse_whitespace(&FORBIDDEN.replace_all(text, " "))
}

/// Collapse whitespace runs (including NBSP) to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_forbidden_characters() {
        assert_eq!(sanitize("a/b:c*d"), "a b c d");
        assert_eq!(sanitize(r#" x<>y|"z"\w? "#), "x y z w");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize("2024년\u{a0}\u{a0}6월   물리학Ⅰ"), "2024년 6월 물리학Ⅰ");
    }
}
