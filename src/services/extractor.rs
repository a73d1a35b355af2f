// src/services/extractor.rs

//! Record extraction from catalogue markup.
//!
//! [`ItemExtractor`] is the seam between the pipeline and the shape of the
//! catalogue markup. [`ActionListExtractor`] handles list items whose download
//! buttons carry their artifact path as the first argument of an inline
//! handler, e.g. `onclick="goDownLoadP('2024/phy1.pdf', '1')"`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractorConfig, RawRecord};
use crate::utils::sanitize;

/// Title used when a list item has no readable text.
const UNTITLED: &str = "제목미상";

static NON_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style").expect("valid script/style selector"));

static QUOTED_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\(\s*(?:'([^']+)'|"([^"]+)")\s*,"#).expect("valid quoted argument pattern")
});

/// Turns one page of markup into records, in document order.
pub trait ItemExtractor: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &str;

    /// Extract every record that carries at least one reference.
    fn extract(&self, markup: &str) -> Vec<RawRecord>;
}

/// Extractor for list items with inline download handlers.
pub struct ActionListExtractor {
    container: Selector,
    item: Selector,
    item_tag: String,
    title: Selector,
    problem_action: Selector,
    solution_action: Selector,
    action_attr: String,
}

impl ActionListExtractor {
    /// Build the extractor, validating every configured selector.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            container: Self::parse_selector(&config.container_selector)?,
            item: Self::parse_selector(&config.item_tag)?,
            item_tag: config.item_tag.to_lowercase(),
            title: Self::parse_selector(&config.title_selector)?,
            problem_action: Self::action_selector(&config.action_attr, &config.problem_action)?,
            solution_action: Self::action_selector(&config.action_attr, &config.solution_action)?,
            action_attr: config.action_attr.clone(),
        })
    }

    fn action_selector(attr: &str, prefix: &str) -> Result<Selector> {
        Self::parse_selector(&format!("[{attr}^=\"{}\"]", prefix.replace('"', "\\\"")))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    /// Records anchored on problem buttons.
    fn extract_by_problem_action(&self, container: ElementRef<'_>) -> Vec<RawRecord> {
        let buttons: Vec<_> = container.select(&self.problem_action).collect();
        log::debug!("{} problem actions found", buttons.len());

        buttons
            .into_iter()
            .filter_map(|button| {
                let item = self.enclosing_item(button)?;
                let problem_ref = self.action_ref(Some(button));
                let solution_ref = self.action_ref(item.select(&self.solution_action).next());
                Self::record(self.title_of(item), problem_ref, solution_ref)
            })
            .collect()
    }

    /// Records from titled list items, looking up either button independently.
    fn extract_by_title(&self, container: ElementRef<'_>) -> Vec<RawRecord> {
        container
            .select(&self.item)
            .filter_map(|item| {
                let title = item.select(&self.title).next()?;
                let problem_ref = self.action_ref(item.select(&self.problem_action).next());
                let solution_ref = self.action_ref(item.select(&self.solution_action).next());
                Self::record(joined_text(title), problem_ref, solution_ref)
            })
            .collect()
    }

    fn record(
        title: String,
        problem_ref: Option<String>,
        solution_ref: Option<String>,
    ) -> Option<RawRecord> {
        if problem_ref.is_none() && solution_ref.is_none() {
            return None;
        }
        let title = sanitize(&title);
        let title = if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Some(RawRecord::new(title, problem_ref, solution_ref))
    }

    fn enclosing_item<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name().eq_ignore_ascii_case(&self.item_tag))
    }

    fn title_of(&self, item: ElementRef<'_>) -> String {
        if let Some(title) = item.select(&self.title).next() {
            return joined_text(title);
        }

        let raw = joined_text(item);
        raw.split("  ").next().unwrap_or_default().to_string()
    }

    fn action_ref(&self, element: Option<ElementRef<'_>>) -> Option<String> {
        first_quoted_arg(element?.value().attr(&self.action_attr)?)
    }
}

impl ItemExtractor for ActionListExtractor {
    fn name(&self) -> &str {
        "action-list"
    }

    fn extract(&self, markup: &str) -> Vec<RawRecord> {
        let mut document = Html::parse_document(markup);
        strip_non_content(&mut document);

        let container = document
            .select(&self.container)
            .next()
            .unwrap_or_else(|| document.root_element());

        let records = self.extract_by_problem_action(container);
        if !records.is_empty() {
            return records;
        }

        let fallback = self.extract_by_title(container);
        if !fallback.is_empty() {
            log::debug!("Title fallback recovered {} records", fallback.len());
        }
        fallback
    }
}

/// Detach script and style subtrees so their text is never scanned.
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Text nodes of `element`, each trimmed, joined with single spaces.
fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First quoted literal argument of an inline call, if followed by a comma.
pub fn first_quoted_arg(action: &str) -> Option<String> {
    let caps = QUOTED_ARG.captures(action)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ActionListExtractor {
        ActionListExtractor::new(&ExtractorConfig::default()).unwrap()
    }

    fn wrap(items: &str) -> String {
        format!(r#"<div class="board_qusesion"><ul>{items}</ul></div>"#)
    }

    #[test]
    fn test_problem_and_solution_pair() {
        let html = wrap(
            r#"<li>
                <p class="tit">2024년 6월 모의평가 물리학Ⅰ</p>
                <button onclick="goDownLoadP('P1', '1')">문제</button>
                <button onclick="goDownLoadH('S1', '1')">해설</button>
            </li>"#,
        );

        let records = extractor().extract(&html);
        assert_eq!(
            records,
            vec![RawRecord::new(
                "2024년 6월 모의평가 물리학Ⅰ",
                Some("P1".to_string()),
                Some("S1".to_string()),
            )]
        );
    }

    #[test]
    fn test_double_quoted_argument_and_missing_solution() {
        let html = wrap(
            r#"<li><span class="tit">화학 </span>
                <a onclick='goDownLoadP("dir/chem.hwp", 2)'>문제</a></li>"#,
        );

        let records = extractor().extract(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "화학");
        assert_eq!(records[0].problem_ref.as_deref(), Some("dir/chem.hwp"));
        assert_eq!(records[0].solution_ref, None);
    }

    #[test]
    fn test_document_order_without_dedup() {
        let item = |title: &str, p: &str| {
            format!(
                r#"<li><p class="tit">{title}</p><button onclick="goDownLoadP('{p}','x')"></button></li>"#
            )
        };
        let html = wrap(&[item("A", "a.pdf"), item("B", "b.pdf"), item("A", "a.pdf")].concat());

        let titles: Vec<_> = extractor()
            .extract(&html)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["A", "B", "A"]);
    }

    #[test]
    fn test_title_fallback_cuts_at_double_space_and_ignores_script() {
        let html = wrap(
            r#"<li>2024년 9월 지구과학Ⅱ  (기출)
                <script>var t = "goDownLoadP('X', 1)";</script>
                <style>.tit { color: red }</style>
                <button onclick="goDownLoadP('P9', '0')">받기</button></li>"#,
        );

        let records = extractor().extract(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "2024년 9월 지구과학Ⅱ");
        assert_eq!(records[0].problem_ref.as_deref(), Some("P9"));
    }

    #[test]
    fn test_sanitizes_title() {
        let html = wrap(
            r#"<li><p class="tit">2023년 <b>수능</b> 생명과학Ⅰ/Ⅱ: 정답?</p>
                <button onclick="goDownLoadP('p', 1)"></button></li>"#,
        );
        assert_eq!(extractor().extract(&html)[0].title, "2023년 수능 생명과학Ⅰ Ⅱ 정답");
    }

    #[test]
    fn test_button_outside_list_item_is_skipped() {
        let html = wrap(r#"<div><button onclick="goDownLoadP('P1', 1)"></button></div>"#);
        assert!(extractor().extract(&html).is_empty());
    }

    #[test]
    fn test_missing_container_uses_whole_document() {
        let html = r#"<ul><li><p class="tit">영어</p>
            <button onclick="goDownLoadP('E1', 1)"></button></li></ul>"#;

        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].problem_ref.as_deref(), Some("E1"));
    }

    #[test]
    fn test_records_without_references_are_dropped() {
        let html = wrap(
            r#"<li><p class="tit">A</p><button onclick="goDownLoadP(noQuotes)"></button></li>
               <li><p class="tit">B</p><button onclick="goDownLoadP('only')"></button></li>"#,
        );
        assert!(extractor().extract(&html).is_empty());
    }

    #[test]
    fn test_solution_only_items_use_title_fallback() {
        let html = wrap(
            r#"<li><p class="tit">2022년 11월 수능 화학Ⅱ</p>
                <button onclick="goDownLoadH('S2', 1)">해설</button></li>
               <li><button onclick="goDownLoadH('S3', 1)">no title</button></li>"#,
        );

        let records = extractor().extract(&html);
        assert_eq!(
            records,
            vec![RawRecord::new(
                "2022년 11월 수능 화학Ⅱ",
                None,
                Some("S2".to_string())
            )]
        );
    }

    #[test]
    fn test_first_quoted_arg() {
        assert_eq!(
            first_quoted_arg("goDownLoadP( 'a/b c.pdf' , 'x')"),
            Some("a/b c.pdf".to_string())
        );
        assert_eq!(first_quoted_arg(r#"goDownLoadH("q", 1)"#), Some("q".to_string()));
        assert_eq!(first_quoted_arg("goDownLoadH('q')"), None);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ExtractorConfig {
            container_selector: "[[bad".to_string(),
            ..ExtractorConfig::default()
        };
        assert!(matches!(
            ActionListExtractor::new(&config),
            Err(AppError::Selector { .. })
        ));
    }
}
