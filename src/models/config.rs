//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FilterParams;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client and request pacing settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Catalogue endpoint and filter selection
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Markup shape of the catalogue list
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Output location and naming templates
    #[serde(default)]
    pub output: OutputConfig,

    /// Renaming of previously downloaded files
    #[serde(default)]
    pub rename: RenameConfig,

    /// Grade lookup (selects the exam tier code)
    #[serde(default = "defaults::grades")]
    pub grades: Vec<GradeOption>,

    /// Category lookup (selects the subject-area code)
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryOption>,

    /// Known subject names used by title normalization
    #[serde(default = "defaults::subjects")]
    pub subjects: Vec<SubjectMapping>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.download_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.download_timeout_secs must be > 0",
            ));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.chunk_size == 0 {
            return Err(AppError::validation("crawler.chunk_size must be > 0"));
        }
        if !self.catalog.list_url.starts_with("http") {
            return Err(AppError::validation("catalog.list_url must be an http(s) URL"));
        }
        if !self.catalog.base_url.starts_with("http") {
            return Err(AppError::validation("catalog.base_url must be an http(s) URL"));
        }
        if self.catalog.begin_year > self.catalog.end_year {
            return Err(AppError::validation(format!(
                "catalog.begin_year ({}) is after catalog.end_year ({})",
                self.catalog.begin_year, self.catalog.end_year
            )));
        }
        if self.catalog.max_pages == 0 {
            return Err(AppError::validation("catalog.max_pages must be > 0"));
        }
        if self.catalog.list_marker.is_empty() {
            return Err(AppError::validation("catalog.list_marker is empty"));
        }
        if self.output.file_template.trim().is_empty() {
            return Err(AppError::validation("output.file_template is empty"));
        }
        if self.subjects.is_empty() {
            return Err(AppError::validation("No subjects defined"));
        }
        self.grade()?;
        self.category()?;
        Ok(())
    }

    /// The grade entry selected by `catalog.grade`.
    pub fn grade(&self) -> Result<&GradeOption> {
        self.grades
            .iter()
            .find(|g| g.key == self.catalog.grade)
            .ok_or_else(|| {
                AppError::config(format!("Unknown grade key '{}'", self.catalog.grade))
            })
    }

    /// The category entry selected by `catalog.category`.
    pub fn category(&self) -> Result<&CategoryOption> {
        self.categories
            .iter()
            .find(|c| c.key == self.catalog.category)
            .ok_or_else(|| {
                AppError::config(format!(
                    "Unknown category key '{}'",
                    self.catalog.category
                ))
            })
    }

    /// Build the catalogue filter map for the current selection.
    pub fn filter_params(&self) -> Result<FilterParams> {
        let grade = self.grade()?;
        let category = self.category()?;
        let catalog = &self.catalog;

        Ok(FilterParams {
            target_code: grade.target_code.clone(),
            begin_year: catalog.begin_year,
            end_year: catalog.end_year,
            month_all: catalog.month_all.clone(),
            month_list: catalog.month_list.clone(),
            months: catalog.months.clone(),
            subject_list: category.subject_code.clone(),
            subject: category.subject_code.clone(),
            sort: catalog.sort.clone(),
            page_size: catalog.page_size,
            search_flag: catalog.search_flag.clone(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            catalog: CatalogConfig::default(),
            extractor: ExtractorConfig::default(),
            output: OutputConfig::default(),
            rename: RenameConfig::default(),
            grades: defaults::grades(),
            categories: defaults::categories(),
            subjects: defaults::subjects(),
        }
    }
}

/// HTTP client and request pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Catalogue request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Per-artifact download timeout in seconds
    #[serde(default = "defaults::download_timeout")]
    pub download_timeout_secs: u64,

    /// Delay between catalogue page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent artifact downloads (1 = sequential)
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Retries for transient catalogue failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries, doubled per attempt
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Write buffer size for streamed downloads, in bytes
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Show download progress bars
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,

    /// Extra headers sent with every request
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            download_timeout_secs: defaults::download_timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
            chunk_size: defaults::chunk_size(),
            show_progress: defaults::show_progress(),
            headers: defaults::headers(),
        }
    }
}

/// Catalogue endpoint, filter values and pagination bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Endpoint that returns the list fragment
    #[serde(default = "defaults::list_url")]
    pub list_url: String,

    /// Prefix for relative artifact references
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Key into `grades`
    #[serde(default = "defaults::grade_key")]
    pub grade: String,

    /// Key into `categories`
    #[serde(default = "defaults::category_key")]
    pub category: String,

    #[serde(default = "defaults::begin_year")]
    pub begin_year: u16,

    #[serde(default = "defaults::end_year")]
    pub end_year: u16,

    /// "on" or "off"
    #[serde(default = "defaults::month_all")]
    pub month_all: String,

    /// Comma-joined month list as the site serializes it
    #[serde(default = "defaults::month_list")]
    pub month_list: String,

    /// Months sent as repeated `month` fields
    #[serde(default = "defaults::months")]
    pub months: Vec<String>,

    #[serde(default = "defaults::sort")]
    pub sort: String,

    #[serde(default)]
    pub page_size: Option<u32>,

    #[serde(default = "defaults::search_flag")]
    pub search_flag: String,

    /// First page number requested
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Hard ceiling on the number of pages fetched
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Substring a non-empty list response must contain
    #[serde(default = "defaults::list_marker")]
    pub list_marker: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_url: defaults::list_url(),
            base_url: defaults::base_url(),
            grade: defaults::grade_key(),
            category: defaults::category_key(),
            begin_year: defaults::begin_year(),
            end_year: defaults::end_year(),
            month_all: defaults::month_all(),
            month_list: defaults::month_list(),
            months: defaults::months(),
            sort: defaults::sort(),
            page_size: None,
            search_flag: defaults::search_flag(),
            start_page: defaults::start_page(),
            max_pages: defaults::max_pages(),
            list_marker: defaults::list_marker(),
        }
    }
}

/// Selectors and action prefixes describing the list markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Wrapper around the list; the whole document is used when absent
    #[serde(default = "defaults::container_selector")]
    pub container_selector: String,

    /// Tag name of a list item
    #[serde(default = "defaults::item_tag")]
    pub item_tag: String,

    /// Title element within a list item
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Attribute holding the inline action call
    #[serde(default = "defaults::action_attr")]
    pub action_attr: String,

    /// Prefix of the problem download call
    #[serde(default = "defaults::problem_action")]
    pub problem_action: String,

    /// Prefix of the solution download call
    #[serde(default = "defaults::solution_action")]
    pub solution_action: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            container_selector: defaults::container_selector(),
            item_tag: defaults::item_tag(),
            title_selector: defaults::title_selector(),
            action_attr: defaults::action_attr(),
            problem_action: defaults::problem_action(),
            solution_action: defaults::solution_action(),
        }
    }
}

/// Output location and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for downloaded files
    #[serde(default = "defaults::output_root")]
    pub root: String,

    /// Directory template relative to `root`
    ///
    /// Placeholders: `{category}`, `{grade}`, `{subject}`, `{year}`,
    /// `{month}`, `{kind}`, `{title}`, `{ext}`
    #[serde(default = "defaults::dir_template")]
    pub dir_template: String,

    /// File name template, same placeholders as `dir_template`
    #[serde(default = "defaults::file_template")]
    pub file_template: String,

    #[serde(default = "defaults::problem_label")]
    pub problem_label: String,

    #[serde(default = "defaults::solution_label")]
    pub solution_label: String,

    /// Leave files that already exist untouched
    #[serde(default)]
    pub skip_existing: bool,

    /// Dump raw catalogue pages under `{root}/_debug`
    #[serde(default)]
    pub debug: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: defaults::output_root(),
            dir_template: defaults::dir_template(),
            file_template: defaults::file_template(),
            problem_label: defaults::problem_label(),
            solution_label: defaults::solution_label(),
            skip_existing: false,
            debug: false,
        }
    }
}

/// Settings for renaming existing files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Month used when a file name carries none
    #[serde(default = "defaults::rename_month")]
    pub default_month: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            default_month: defaults::rename_month(),
        }
    }
}

/// Grade entry: exam tier code plus the grade label used in paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeOption {
    pub key: String,
    pub target_code: String,
    pub name: String,
}

/// Category entry: subject-area code plus the category label used in paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOption {
    pub key: String,
    pub subject_code: String,
    pub name: String,
}

/// A known subject: any candidate containing `needle` maps to `canonical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectMapping {
    pub needle: String,
    pub canonical: String,
}

impl SubjectMapping {
    fn new(needle: &str, canonical: &str) -> Self {
        Self {
            needle: needle.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    use super::{CategoryOption, GradeOption, SubjectMapping};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; exam-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn download_timeout() -> u64 {
        300
    }
    pub fn request_delay() -> u64 {
        200
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_backoff() -> u64 {
        1000
    }
    pub fn chunk_size() -> usize {
        64 * 1024
    }
    pub fn show_progress() -> bool {
        true
    }
    pub fn headers() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Origin".to_string(), "https://www.ebsi.co.kr".to_string()),
            (
                "Referer".to_string(),
                "https://www.ebsi.co.kr/ebs/xip/xipc/previousPaperList.ebs?targetCd=D300"
                    .to_string(),
            ),
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
            ("Accept".to_string(), "text/html, */*; q=0.01".to_string()),
        ])
    }

    // Catalogue defaults
    pub fn list_url() -> String {
        "https://www.ebsi.co.kr/ebs/xip/xipc/previousPaperListAjax.ajax".into()
    }
    pub fn base_url() -> String {
        "https://wdown.ebsi.co.kr/W61001/01exam".into()
    }
    pub fn grade_key() -> String {
        "3".into()
    }
    pub fn category_key() -> String {
        "6".into()
    }
    pub fn begin_year() -> u16 {
        2020
    }
    pub fn end_year() -> u16 {
        2025
    }
    pub fn month_all() -> String {
        "on".into()
    }
    pub fn month_list() -> String {
        "03,02,04,05,06,07,09,10,11,12".into()
    }
    pub fn months() -> Vec<String> {
        ["03", "04", "06", "07", "09", "10", "11"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }
    pub fn sort() -> String {
        "recent".into()
    }
    pub fn search_flag() -> String {
        "Y".into()
    }
    pub fn start_page() -> u32 {
        1
    }
    pub fn max_pages() -> u32 {
        100
    }
    pub fn list_marker() -> String {
        "<li".into()
    }

    // Extractor defaults
    pub fn container_selector() -> String {
        "div.board_qusesion".into()
    }
    pub fn item_tag() -> String {
        "li".into()
    }
    pub fn title_selector() -> String {
        ".tit".into()
    }
    pub fn action_attr() -> String {
        "onclick".into()
    }
    pub fn problem_action() -> String {
        "goDownLoadP(".into()
    }
    pub fn solution_action() -> String {
        "goDownLoadH(".into()
    }

    // Output defaults
    pub fn output_root() -> String {
        "downloads".into()
    }
    pub fn dir_template() -> String {
        "{category}_{grade}_{category}_{subject}_{year}".into()
    }
    pub fn file_template() -> String {
        "{year}_{month}_{subject}_{kind}{ext}".into()
    }
    pub fn problem_label() -> String {
        "문제".into()
    }
    pub fn solution_label() -> String {
        "해설".into()
    }
    pub fn rename_month() -> String {
        "12".into()
    }

    // Lookup tables
    pub fn grades() -> Vec<GradeOption> {
        [("1", "D100", "고1"), ("2", "D200", "고2"), ("3", "D300", "고3")]
            .iter()
            .map(|(key, code, name)| GradeOption {
                key: key.to_string(),
                target_code: code.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    pub fn categories() -> Vec<CategoryOption> {
        [
            ("1", "1", "국어"),
            ("2", "2", "수학"),
            ("3", "3", "영어"),
            ("4", "4", "한국사"),
            ("5", "5", "사탐"),
            ("6", "6", "과탐"),
            ("7", "7", "직탐"),
            ("8", "8", "제2외국어"),
        ]
        .iter()
        .map(|(key, code, name)| CategoryOption {
            key: key.to_string(),
            subject_code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
    }

    pub fn subjects() -> Vec<SubjectMapping> {
        vec![
            SubjectMapping::new("물리학", "물리"),
            SubjectMapping::new("물리", "물리"),
            SubjectMapping::new("화학", "화학"),
            SubjectMapping::new("생명과학", "생명과학"),
            SubjectMapping::new("지구과학", "지구과학"),
            SubjectMapping::new("통합과학", "통합과학"),
            SubjectMapping::new("통합사회", "통합사회"),
            SubjectMapping::new("생활과윤리", "생활과윤리"),
            SubjectMapping::new("윤리와사상", "윤리와사상"),
            SubjectMapping::new("한국지리", "한국지리"),
            SubjectMapping::new("세계지리", "세계지리"),
            SubjectMapping::new("동아시아사", "동아시아사"),
            SubjectMapping::new("세계사", "세계사"),
            SubjectMapping::new("한국사", "한국사"),
            SubjectMapping::new("정치와법", "정치와법"),
            SubjectMapping::new("경제", "경제"),
            SubjectMapping::new("사회문화", "사회문화"),
            SubjectMapping::new("사회·문화", "사회문화"),
            SubjectMapping::new("화법과작문", "화법과작문"),
            SubjectMapping::new("언어와매체", "언어와매체"),
            SubjectMapping::new("국어", "국어"),
            SubjectMapping::new("확률과통계", "확률과통계"),
            SubjectMapping::new("미적분", "미적분"),
            SubjectMapping::new("기하", "기하"),
            SubjectMapping::new("수학", "수학"),
            SubjectMapping::new("영어", "영어"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_year_range() {
        let mut config = Config::default();
        config.catalog.begin_year = 2024;
        config.catalog.end_year = 2020;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_grade() {
        let mut config = Config::default();
        config.catalog.grade = "9".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn filter_params_follow_selection() {
        let mut config = Config::default();
        config.catalog.grade = "2".to_string();
        config.catalog.category = "2".to_string();

        let params = config.filter_params().unwrap();
        assert_eq!(params.target_code, "D200");
        assert_eq!(params.subject, "2");
        assert_eq!(params.subject_list, "2");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            begin_year = 2018
            end_year = 2019

            [output]
            root = "papers"
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog.begin_year, 2018);
        assert_eq!(config.catalog.list_marker, "<li");
        assert_eq!(config.output.root, "papers");
        assert_eq!(config.output.problem_label, "문제");
        assert!(!config.subjects.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bundled_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/storage/config.toml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.grade().unwrap().target_code, "D300");
        assert_eq!(config.category().unwrap().name, "과탐");
        assert_eq!(config.crawler.headers.len(), 4);
        assert!(config.validate().is_ok());
    }
}
