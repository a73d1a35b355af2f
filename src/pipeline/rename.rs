// src/pipeline/rename.rs

//! Renaming pass over an existing download directory.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::{FileRenamer, RenameReport};

/// Rename the files in `dir` to the configured file template.
pub async fn run_rename(config: &Config, dir: &Path, dry_run: bool) -> Result<RenameReport> {
    if !dir.is_dir() {
        return Err(AppError::config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let renamer = FileRenamer::from_config(config)?;
    let report = renamer.rename_dir(dir, dry_run).await?;

    log::info!(
        "Rename complete: {} renamed, {} unchanged, {} skipped, {} conflicts{}",
        report.renamed,
        report.unchanged,
        report.skipped,
        report.conflicts,
        if dry_run { " (dry run)" } else { "" }
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_rename(&Config::default(), &dir.path().join("absent"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
