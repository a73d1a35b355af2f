// src/utils/cookie.rs

//! Parsing of raw `Cookie:` header values.

use std::sync::Arc;

use reqwest::cookie::Jar;
use url::Url;

/// Split a `Cookie:` header value into name/value pairs.
///
/// Pieces without `=` are ignored; values wrapped in matching single or
/// double quotes are unwrapped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .filter_map(|piece| piece.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), unquote(value.trim()).to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Build a cookie jar holding `pairs` for every URL in `scopes`.
pub fn build_jar(pairs: &[(String, String)], scopes: &[Url]) -> Arc<Jar> {
    let jar = Jar::default();
    for url in scopes {
        for (name, value) in pairs {
            jar.add_cookie_str(&format!("{name}={value}; Path=/"), url);
        }
    }
    Arc::new(jar)
}

#[cfg(test)]
mod tests {
    use reqwest::cookie::CookieStore;

    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let pairs = parse_cookie_header(r#"JSESSIONID=abc; token="q=1"; junk ; lang='ko';"#);
        assert_eq!(
            pairs,
            vec![
                ("JSESSIONID".to_string(), "abc".to_string()),
                ("token".to_string(), "q=1".to_string()),
                ("lang".to_string(), "ko".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_header() {
        assert!(parse_cookie_header("").is_empty());
        assert!(parse_cookie_header(" ; ;").is_empty());
    }

    #[test]
    fn test_unquote_keeps_unbalanced() {
        assert_eq!(unquote("\"abc"), "\"abc");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_jar_scoped_to_hosts() {
        let list = Url::parse("https://www.example.com/list.ajax").unwrap();
        let other = Url::parse("https://elsewhere.com/").unwrap();
        let jar = build_jar(&[("sid".to_string(), "42".to_string())], &[list.clone()]);

        let header = jar.cookies(&list).unwrap();
        assert_eq!(header.to_str().unwrap(), "sid=42");
        assert!(jar.cookies(&other).is_none());
    }
}
