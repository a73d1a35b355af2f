// src/services/taxonomy.rs

//! Title normalization.
//!
//! Turns free-form catalogue titles such as `2024년 6월 고3 모의평가 물리학Ⅰ`
//! into a [`Taxonomy`]. Normalization never fails; missing parts fall back to
//! [`UNKNOWN_YEAR`] and [`UNKNOWN_MONTH`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::models::{Config, SubjectMapping, Taxonomy, UNKNOWN_MONTH, UNKNOWN_YEAR};

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})\s*년").expect("valid year pattern"));

/// Month patterns in priority order: `6월`, `6.4 시행`, `6.4`.
static MONTHS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?:^|\D)(\d{1,2})\s*월",
        r"(?:^|\D)(\d{1,2})\.\s*\d{1,2}\.?\s*시행",
        r"(?:^|\D)(\d{1,2})\.\d{1,2}(?:\D|$)",
    ]
    .map(|p| Regex::new(p).expect("valid month pattern"))
});

const ROMAN_NUMERALS: [(char, char); 4] = [('Ⅰ', '1'), ('Ⅱ', '2'), ('Ⅲ', '3'), ('Ⅳ', '4')];

/// Longest first so `III` is not read as `II` + `I`.
const ASCII_NUMERALS: [(&str, char); 4] = [("III", '3'), ("IV", '4'), ("II", '2'), ("I", '1')];

/// Subject placeholder for titles with no tokens at all.
const UNKNOWN_SUBJECT: &str = "과목";

/// Maps titles to year, month and subject for one category/grade selection.
#[derive(Debug, Clone)]
pub struct TaxonomyNormalizer {
    /// Sorted by needle length, longest first
    subjects: Vec<SubjectMapping>,
    category: String,
    grade: String,
}

impl TaxonomyNormalizer {
    /// Create a normalizer.
    ///
    /// Subject needles are reordered longest-first so that a compound name is
    /// always tried before any shorter name it contains.
    pub fn new(
        subjects: &[SubjectMapping],
        category: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        let mut subjects = subjects.to_vec();
        subjects.sort_by_key(|s| std::cmp::Reverse(s.needle.chars().count()));
        Self {
            subjects,
            category: category.into(),
            grade: grade.into(),
        }
    }

    /// Create a normalizer for the category and grade selected in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.subjects,
            &config.category()?.name,
            &config.grade()?.name,
        ))
    }

    /// Derive the taxonomy of a title.
    pub fn normalize(&self, title: &str) -> Taxonomy {
        let candidate = title.split_whitespace().last().unwrap_or(UNKNOWN_SUBJECT);
        let (subject_base, subject_level) = self.normalize_subject(candidate);

        Taxonomy {
            year: extract_year(title).unwrap_or_else(|| UNKNOWN_YEAR.to_string()),
            month: extract_month(title).unwrap_or_else(|| UNKNOWN_MONTH.to_string()),
            subject_base,
            subject_level,
            category: self.category.clone(),
            grade: self.grade.clone(),
        }
    }

    /// Split a subject candidate into canonical base name and level.
    ///
    /// Unknown names pass through with only numerals and spaces normalized.
    pub fn normalize_subject(&self, candidate: &str) -> (String, Option<u8>) {
        let compact: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = replace_ascii_numeral(&replace_roman_numerals(&compact));

        let (rest, level) = split_level(&compact);
        let base = self
            .canonical(rest)
            .map(str::to_string)
            .unwrap_or_else(|| rest.to_string());
        (base, level)
    }

    /// Find a known subject anywhere in `text`, with a level directly after it.
    pub fn find_subject(&self, text: &str) -> Option<(String, Option<u8>)> {
        let text = replace_roman_numerals(text);
        self.subjects.iter().find_map(|mapping| {
            let pos = text.find(&mapping.needle)?;
            let after = &text[pos + mapping.needle.len()..];
            Some((mapping.canonical.clone(), leading_level(after)))
        })
    }

    fn canonical(&self, candidate: &str) -> Option<&str> {
        self.subjects
            .iter()
            .find(|mapping| candidate.contains(&mapping.needle))
            .map(|mapping| mapping.canonical.as_str())
    }
}

/// First four-digit year marked with `년`.
pub fn extract_year(title: &str) -> Option<String> {
    YEAR.captures(title).map(|caps| caps[1].to_string())
}

/// Month from the first matching month pattern, zero-padded.
pub fn extract_month(title: &str) -> Option<String> {
    MONTHS.iter().find_map(|pattern| {
        let caps = pattern.captures(title)?;
        let month: u8 = caps[1].parse().ok()?;
        Some(format!("{month:02}"))
    })
}

fn replace_roman_numerals(text: &str) -> String {
    text.chars()
        .map(|c| {
            ROMAN_NUMERALS
                .iter()
                .find(|(roman, _)| *roman == c)
                .map_or(c, |(_, digit)| *digit)
        })
        .collect()
}

/// Replace a trailing ASCII roman numeral that follows a non-Latin name.
fn replace_ascii_numeral(text: &str) -> String {
    for (numeral, digit) in ASCII_NUMERALS {
        if let Some(prefix) = text.strip_suffix(numeral) {
            if prefix
                .chars()
                .last()
                .is_some_and(|c| !c.is_ascii_alphabetic())
            {
                return format!("{prefix}{digit}");
            }
        }
    }
    text.to_string()
}

/// Split off a trailing level digit 1–4 that follows a non-digit.
fn split_level(text: &str) -> (&str, Option<u8>) {
    let mut chars = text.chars().rev();
    if let (Some(last), Some(before)) = (chars.next(), chars.next()) {
        if ('1'..='4').contains(&last) && !before.is_ascii_digit() {
            let level = last.to_digit(10).map(|d| d as u8);
            return (&text[..text.len() - 1], level);
        }
    }
    (text, None)
}

/// Level written directly after a subject name (`1`, `Ⅱ`, `II`).
fn leading_level(after: &str) -> Option<u8> {
    let mut chars = after.chars();
    let first = chars.next()?;
    if ('1'..='4').contains(&first) {
        return match chars.next() {
            Some(next) if next.is_ascii_digit() => None,
            _ => first.to_digit(10).map(|d| d as u8),
        };
    }

    ASCII_NUMERALS.iter().find_map(|(numeral, digit)| {
        let rest = after.strip_prefix(numeral)?;
        if rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        digit.to_digit(10).map(|d| d as u8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TaxonomyNormalizer {
        TaxonomyNormalizer::from_config(&Config::default()).unwrap()
    }

    fn subject(candidate: &str) -> String {
        let (base, level) = normalizer().normalize_subject(candidate);
        match level {
            Some(level) => format!("{base}{level}"),
            None => base,
        }
    }

    #[test]
    fn test_year_extraction() {
        assert_eq!(extract_year("2024년 6월 모의평가"), Some("2024".to_string()));
        assert_eq!(extract_year("2019 년 수능"), Some("2019".to_string()));
        assert_eq!(extract_year("2025학년도 수능"), None);

        let t = normalizer().normalize("2025학년도 대학수학능력시험 화학Ⅰ");
        assert_eq!(t.year, UNKNOWN_YEAR);
    }

    #[test]
    fn test_month_marked() {
        assert_eq!(extract_month("2024년 6월 모의평가"), Some("06".to_string()));
        assert_eq!(extract_month("2024년11월 수능"), Some("11".to_string()));
    }

    #[test]
    fn test_month_executed_marker() {
        assert_eq!(extract_month("2023.9.6 시행 모의평가"), Some("09".to_string()));
        assert_eq!(extract_month("제 3.23. 시행"), Some("03".to_string()));
    }

    #[test]
    fn test_month_dotted_without_marker() {
        assert_eq!(extract_month("학력평가 (4.12) 물리학Ⅰ"), Some("04".to_string()));
    }

    #[test]
    fn test_month_priority_prefers_marker() {
        assert_eq!(extract_month("3.10 시행 7월 학력평가"), Some("07".to_string()));
    }

    #[test]
    fn test_month_missing() {
        let t = normalizer().normalize("2024년 대학수학능력시험 지구과학Ⅱ");
        assert_eq!(t.month, UNKNOWN_MONTH);
    }

    #[test]
    fn test_subject_known_names() {
        assert_eq!(subject("물리학Ⅰ"), "물리1");
        assert_eq!(subject("생명과학Ⅱ"), "생명과학2");
        assert_eq!(subject("화학"), "화학");
        assert_eq!(subject("지구과학II"), "지구과학2");
        assert_eq!(subject("물리학III"), "물리3");
        assert_eq!(subject("사회·문화"), "사회문화");
    }

    #[test]
    fn test_subject_unknown_passes_through() {
        assert_eq!(subject("프로그래밍"), "프로그래밍");
        assert_eq!(subject("미술창작3"), "미술창작3");
        assert_eq!(subject("2024"), "2024");
    }

    #[test]
    fn test_longest_needle_wins_regardless_of_order() {
        let subjects = vec![
            SubjectMapping {
                needle: "과학".into(),
                canonical: "과학".into(),
            },
            SubjectMapping {
                needle: "통합과학".into(),
                canonical: "통합과학".into(),
            },
        ];
        let normalizer = TaxonomyNormalizer::new(&subjects, "과탐", "고1");
        assert_eq!(
            normalizer.normalize_subject("통합과학"),
            ("통합과학".to_string(), None)
        );
        assert_eq!(normalizer.normalize_subject("과학"), ("과학".to_string(), None));
    }

    #[test]
    fn test_normalize_full_title() {
        let t = normalizer().normalize("2024년 6월 고3 모의평가\u{a0}물리학Ⅰ");
        assert_eq!(t.year, "2024");
        assert_eq!(t.month, "06");
        assert_eq!(t.subject(), "물리1");
        assert_eq!(t.category, "과탐");
        assert_eq!(t.grade, "고3");
    }

    #[test]
    fn test_normalize_empty_title() {
        let t = normalizer().normalize("   ");
        assert_eq!(t.year, UNKNOWN_YEAR);
        assert_eq!(t.month, UNKNOWN_MONTH);
        assert_eq!(t.subject(), UNKNOWN_SUBJECT);
    }

    #[test]
    fn test_find_subject_anywhere() {
        let n = normalizer();
        assert_eq!(
            n.find_subject("2024년 6월 모의평가 물리학Ⅰ_해"),
            Some(("물리".to_string(), Some(1)))
        );
        assert_eq!(
            n.find_subject("2023_09_생명과학II_문제"),
            Some(("생명과학".to_string(), Some(2)))
        );
        assert_eq!(n.find_subject("화학_2024"), Some(("화학".to_string(), None)));
        assert_eq!(n.find_subject("notes"), None);
    }
}
