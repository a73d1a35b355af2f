// src/services/renamer.rs

//! Renames previously downloaded files to the configured file template.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs;

use crate::error::Result;
use crate::models::{Config, ResourceKind, Taxonomy};
use crate::services::taxonomy::{extract_month, extract_year};
use crate::services::{PathBuilder, TaxonomyNormalizer};

static BARE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(20\d{2})").expect("valid bare year pattern"));

/// Counts from one rename pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub conflicts: usize,
}

/// Classifies file names and moves them to template names in place.
pub struct FileRenamer {
    normalizer: TaxonomyNormalizer,
    paths: PathBuilder,
    default_month: String,
}

impl FileRenamer {
    pub fn new(normalizer: TaxonomyNormalizer, paths: PathBuilder, default_month: &str) -> Self {
        Self {
            normalizer,
            paths,
            default_month: default_month.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            TaxonomyNormalizer::from_config(config)?,
            PathBuilder::from_config(config),
            &config.rename.default_month,
        ))
    }

    /// New file name for `file_name`, or `None` when year or subject is missing.
    pub fn plan(&self, file_name: &str) -> Option<String> {
        let path = Path::new(file_name);
        let stem = path.file_stem()?.to_string_lossy();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let year = extract_year(&stem)
            .or_else(|| BARE_YEAR.captures(&stem).map(|caps| caps[1].to_string()))?;
        let (subject_base, subject_level) = self.normalizer.find_subject(&stem)?;
        let month = extract_month(&stem).unwrap_or_else(|| self.default_month.clone());

        let kind = if stem.contains("_해") || stem.contains("해설") {
            ResourceKind::Solution
        } else {
            ResourceKind::Problem
        };

        let taxonomy = Taxonomy {
            year,
            month,
            subject_base,
            subject_level,
            category: String::new(),
            grade: String::new(),
        };
        Some(self.paths.file_name(&taxonomy, &stem, kind, &ext))
    }

    /// Rename every classifiable file directly inside `dir`.
    ///
    /// Existing targets are never overwritten. With `dry_run` nothing moves.
    pub async fn rename_dir(&self, dir: &Path, dry_run: bool) -> Result<RenameReport> {
        let mut report = RenameReport::default();
        let mut entries = fs::read_dir(dir).await?;
        let mut files: Vec<PathBuf> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        for path in files {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            let Some(new_name) = self.plan(&name) else {
                log::warn!("Skipping {}: no year or known subject", name);
                report.skipped += 1;
                continue;
            };

            if new_name == name {
                report.unchanged += 1;
                continue;
            }

            let target = dir.join(&new_name);
            if fs::try_exists(&target).await? {
                log::warn!("Not renaming {} -> {}: target exists", name, new_name);
                report.conflicts += 1;
                continue;
            }

            if dry_run {
                log::info!("[dry-run] {} -> {}", name, new_name);
            } else {
                fs::rename(&path, &target).await?;
                log::info!("{} -> {}", name, new_name);
            }
            report.renamed += 1;
        }

        Ok(report)
    }
}
