// src/services/paginator.rs

//! Catalogue pagination.
//!
//! Pages are requested in order starting at `catalog.start_page`. Pagination
//! stops at the first page that lacks the list marker ([`PageOutcome::Empty`]),
//! the first page whose list yields no records ([`PageOutcome::Unparsed`]), or
//! the page ceiling. A failed request is returned as an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CatalogConfig, PageOutcome, PageResult, RawRecord};
use crate::services::ItemExtractor;

/// Source of raw catalogue markup, one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<String>;
}

/// Drives page retrieval and extraction.
pub struct CatalogPaginator<'a> {
    source: &'a dyn PageSource,
    extractor: &'a dyn ItemExtractor,
    list_marker: String,
    first_page: u32,
    next_page: u32,
    last_page: u32,
    delay: Duration,
    dump_dir: Option<PathBuf>,
    finished: bool,
}

impl<'a> CatalogPaginator<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        extractor: &'a dyn ItemExtractor,
        config: &CatalogConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            list_marker: config.list_marker.clone(),
            first_page: config.start_page,
            next_page: config.start_page,
            last_page: config
                .start_page
                .saturating_add(config.max_pages.saturating_sub(1)),
            delay: Duration::ZERO,
            dump_dir: None,
            finished: config.max_pages == 0,
        }
    }

    /// Pause between consecutive page requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write each raw page to `dir/page_{n}.html`.
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// Fetch and extract a single page.
    pub async fn fetch_page(&self, page: u32) -> Result<PageResult> {
        let markup = self.source.fetch(page).await?;
        if let Some(dir) = &self.dump_dir {
            self.dump(dir, page, &markup).await;
        }

        let has_list = markup.contains(&self.list_marker);
        let records = if has_list {
            self.extractor.extract(&markup)
        } else {
            Vec::new()
        };
        Ok(PageResult::new(page, has_list, records))
    }

    /// Fetch the next page, or `None` once pagination has ended.
    ///
    /// The page that ends pagination is still returned so callers can see
    /// its outcome.
    pub async fn next_page(&mut self) -> Result<Option<PageResult>> {
        if self.finished {
            return Ok(None);
        }
        if self.next_page > self.last_page {
            log::warn!(
                "Page ceiling reached after page {}; stopping pagination",
                self.last_page
            );
            self.finished = true;
            return Ok(None);
        }

        let page = self.next_page;
        if !self.delay.is_zero() && page != self.first_page {
            tokio::time::sleep(self.delay).await;
        }

        let result = self.fetch_page(page).await?;
        match result.outcome {
            PageOutcome::Records => {
                log::info!(
                    "Page {}: {} records ({})",
                    page,
                    result.records.len(),
                    self.extractor.name()
                );
            }
            PageOutcome::Empty => {
                log::info!("Page {page}: no list in response, pagination complete");
            }
            PageOutcome::Unparsed => {
                log::warn!(
                    "Page {page}: list present but no records extracted; markup may have changed"
                );
            }
        }

        self.finished = !result.has_more();
        self.next_page = page.saturating_add(1);
        Ok(Some(result))
    }

    /// Fetch every remaining page and return all records in order.
    pub async fn collect_all(&mut self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page.records);
        }
        Ok(records)
    }

    async fn dump(&self, dir: &Path, page: u32, markup: &str) {
        let path = dir.join(format!("page_{page}.html"));
        let write = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, markup).await
        };
        match write.await {
            Ok(()) => log::debug!("Saved raw page to {}", path.display()),
            Err(e) => log::warn!("Could not save raw page {}: {}", path.display(), e),
        }
    }
}
