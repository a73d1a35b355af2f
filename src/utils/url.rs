// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::LazyLock;

use regex::Regex;

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.([A-Za-z0-9]{1,5})(?:[?#]|$)").expect("valid extension pattern")
});

/// Resolve an artifact reference against a base URL.
///
/// Surrounding whitespace and quote characters are stripped. References that
/// already carry a scheme are returned unchanged; anything else is appended to
/// `base` with exactly one `/` at the seam.
///
/// # Examples
/// ```
/// use exam_crawler::utils::url::resolve;
///
/// assert_eq!(
///     resolve(Some("/docs/x.pdf"), "https://host/base"),
///     Some("https://host/base/docs/x.pdf".to_string())
/// );
/// ```
pub fn resolve(reference: Option<&str>, base: &str) -> Option<String> {
    let reference = clean_reference(reference?);
    if reference.is_empty() {
        return None;
    }

    // Already absolute
    if is_absolute(reference) {
        return Some(reference.to_string());
    }

    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    ))
}

fn clean_reference(reference: &str) -> &str {
    reference
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
}

fn is_absolute(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// File extension (with the dot) found in `url`.
///
/// The last `.` followed by 1–5 alphanumerics that ends the URL or sits
/// directly before `?` or `#` wins, so `download.do?file=exam.hwp` yields
/// `.hwp`. Falls back to `default` when there is none.
pub fn ext_from_url(url: Option<&str>, default: &str) -> String {
    url.and_then(|url| EXTENSION.captures_iter(url).last())
        .map(|caps| format!(".{}", &caps[1]))
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://host/base";

    #[test]
    fn test_resolve_relative_with_leading_slash() {
        assert_eq!(
            resolve(Some("/docs/x.pdf"), BASE),
            Some("https://host/base/docs/x.pdf".to_string())
        );
    }

    #[test]
    fn test_resolve_relative_against_trailing_slash_base() {
        assert_eq!(
            resolve(Some("docs/x.pdf"), "https://host/base/"),
            Some("https://host/base/docs/x.pdf".to_string())
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        assert_eq!(
            resolve(Some("https://other/y.pdf"), BASE),
            Some("https://other/y.pdf".to_string())
        );
        assert_eq!(
            resolve(Some("HTTP://other/y.pdf"), BASE),
            Some("HTTP://other/y.pdf".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_quotes_and_whitespace() {
        assert_eq!(
            resolve(Some(" '2024/phy.pdf' "), BASE),
            Some("https://host/base/2024/phy.pdf".to_string())
        );
    }

    #[test]
    fn test_resolve_missing_reference() {
        assert_eq!(resolve(None, BASE), None);
        assert_eq!(resolve(Some("  \"\" "), BASE), None);
    }

    #[test]
    fn test_ext_from_url() {
        assert_eq!(ext_from_url(Some("https://h/a/b.hwp"), ".pdf"), ".hwp");
        assert_eq!(ext_from_url(Some("https://h/a/b.PDF?x=1#top"), ".pdf"), ".PDF");
        assert_eq!(ext_from_url(Some("https://h/download?id=3"), ".pdf"), ".pdf");
        assert_eq!(ext_from_url(Some("https://h.example.com"), ".pdf"), ".com");
        assert_eq!(
            ext_from_url(Some("https://h/download.do?file=exam.hwp"), ".pdf"),
            ".hwp"
        );
        assert_eq!(ext_from_url(Some("https://h/a.toolong"), ".pdf"), ".pdf");
        assert_eq!(ext_from_url(Some("a/b.zip#frag"), ".pdf"), ".zip");
        assert_eq!(ext_from_url(None, ".pdf"), ".pdf");
    }
}
