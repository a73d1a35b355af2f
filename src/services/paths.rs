// src/services/paths.rs

//! Artifact URLs and output paths.

use std::path::{Path, PathBuf};

use crate::models::{Config, OutputConfig, RawRecord, Resource, ResourceKind, Taxonomy};
use crate::utils::sanitize;
use crate::utils::url::{ext_from_url, resolve};

/// Extension used when a URL does not reveal one.
pub const DEFAULT_EXT: &str = ".pdf";

/// Derives resolved URLs and target paths from records and their taxonomy.
///
/// Templates accept `{category}`, `{grade}`, `{subject}`, `{year}`, `{month}`,
/// `{kind}`, `{title}` and `{ext}`. A `/` in the directory template nests
/// directories.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    root: PathBuf,
    base_url: String,
    dir_template: String,
    file_template: String,
    problem_label: String,
    solution_label: String,
}

impl PathBuilder {
    pub fn new(output: &OutputConfig, base_url: impl Into<String>) -> Self {
        Self {
            root: PathBuf::from(&output.root),
            base_url: base_url.into(),
            dir_template: output.dir_template.clone(),
            file_template: output.file_template.clone(),
            problem_label: output.problem_label.clone(),
            solution_label: output.solution_label.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output, &config.catalog.base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute URL for a reference; `None` when there is no reference.
    pub fn resolve(&self, reference: Option<&str>) -> Option<String> {
        resolve(reference, &self.base_url)
    }

    /// Label rendered for `{kind}`.
    pub fn label(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Problem => &self.problem_label,
            ResourceKind::Solution => &self.solution_label,
        }
    }

    /// File name for one resource, without directories.
    pub fn file_name(
        &self,
        taxonomy: &Taxonomy,
        title: &str,
        kind: ResourceKind,
        ext: &str,
    ) -> String {
        self.render(&self.file_template, taxonomy, title, kind, ext)
    }

    /// Full target path: root, rendered directory template, file name.
    pub fn local_path(
        &self,
        taxonomy: &Taxonomy,
        title: &str,
        kind: ResourceKind,
        ext: &str,
    ) -> PathBuf {
        let dir = self.render(&self.dir_template, taxonomy, title, kind, ext);
        let mut path = self.root.clone();
        for component in dir.split('/').map(str::trim).filter(|c| !c.is_empty()) {
            path.push(component);
        }
        path.push(self.file_name(taxonomy, title, kind, ext));
        path
    }

    /// One resource per reference the record carries.
    pub fn resources(&self, record: &RawRecord, taxonomy: &Taxonomy) -> Vec<Resource> {
        ResourceKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let source_ref = record.reference(kind)?;
                let resolved_url = self.resolve(Some(source_ref));
                let ext = ext_from_url(resolved_url.as_deref(), DEFAULT_EXT);
                Some(Resource {
                    kind,
                    source_ref: source_ref.to_string(),
                    local_path: self.local_path(taxonomy, &record.title, kind, &ext),
                    resolved_url,
                })
            })
            .collect()
    }

    fn render(
        &self,
        template: &str,
        taxonomy: &Taxonomy,
        title: &str,
        kind: ResourceKind,
        ext: &str,
    ) -> String {
        template
            .replace("{category}", &sanitize(&taxonomy.category))
            .replace("{grade}", &sanitize(&taxonomy.grade))
            .replace("{subject}", &sanitize(&taxonomy.subject()))
            .replace("{year}", &taxonomy.year)
            .replace("{month}", &taxonomy.month)
            .replace("{kind}", &sanitize(self.label(kind)))
            .replace("{title}", &sanitize(title))
            .replace("{ext}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            year: "2024".into(),
            month: "06".into(),
            subject_base: "물리".into(),
            subject_level: Some(1),
            category: "과탐".into(),
            grade: "고3".into(),
        }
    }

    fn builder(output: OutputConfig) -> PathBuilder {
        PathBuilder::new(&output, "https://host/base")
    }

    fn output(root: &str) -> OutputConfig {
        OutputConfig {
            root: root.to_string(),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_default_layout() {
        let path = builder(output("out")).local_path(
            &taxonomy(),
            "2024년 6월 물리학Ⅰ",
            ResourceKind::Solution,
            ".pdf",
        );
        assert_eq!(
            path,
            Path::new("out")
                .join("과탐_고3_과탐_물리1_2024")
                .join("2024_06_물리1_해설.pdf")
        );
    }

    #[test]
    fn test_nested_template_and_sanitized_title() {
        let config = OutputConfig {
            dir_template: "{year}/{subject}".to_string(),
            file_template: "{title}_{kind}{ext}".to_string(),
            problem_label: "Q".to_string(),
            ..output("root")
        };
        let path = builder(config).local_path(
            &taxonomy(),
            "a/b: c",
            ResourceKind::Problem,
            ".hwp",
        );
        assert_eq!(
            path,
            Path::new("root").join("2024").join("물리1").join("a b c_Q.hwp")
        );
    }

    #[test]
    fn test_resources_for_present_references_only() {
        let record = RawRecord::new("t", Some("/2024/p1.hwp".to_string()), None);
        let resources = builder(output("out")).resources(&record, &taxonomy());

        assert_eq!(resources.len(), 1);
        let problem = &resources[0];
        assert_eq!(problem.kind, ResourceKind::Problem);
        assert_eq!(
            problem.resolved_url.as_deref(),
            Some("https://host/base/2024/p1.hwp")
        );
        assert!(problem.local_path.ends_with("2024_06_물리1_문제.hwp"));
    }

    #[test]
    fn test_resources_keep_absolute_urls() {
        let record = RawRecord::new(
            "t",
            Some("p".to_string()),
            Some("https://other/y".to_string()),
        );
        let resources = builder(output("out")).resources(&record, &taxonomy());

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].resolved_url.as_deref(), Some("https://other/y"));
        assert!(resources[1].local_path.ends_with("2024_06_물리1_해설.pdf"));
    }
}
