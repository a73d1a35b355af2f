// src/pipeline/run.rs

//! Catalogue download pipeline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use reqwest::cookie::Jar;
use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::models::{Config, PageOutcome, PageResult, Resource, ResourceKind};
use crate::services::{
    ActionListExtractor, ArtifactDownloader, ArtifactFetcher, CatalogPaginator,
    HttpCatalogSource, PathBuilder, RetryPolicy, TaxonomyNormalizer,
};
use crate::utils::cookie::{build_jar, parse_cookie_header};
use crate::utils::http::create_async_client;

/// Counters for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Pages that yielded records
    pub pages: u32,
    pub records: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub missing: usize,
    pub bytes: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            pages: 0,
            records: 0,
            downloaded: 0,
            failed: 0,
            skipped: 0,
            missing: 0,
            bytes: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn log(&self) {
        log::info!(
            "Run complete: {} pages, {} records, {} downloaded, {} failed, {} skipped, {} missing ({} bytes in {:.1}s)",
            self.pages,
            self.records,
            self.downloaded,
            self.failed,
            self.skipped,
            self.missing,
            self.bytes,
            self.elapsed().num_milliseconds() as f64 / 1000.0
        );
    }
}

/// Turns catalogue pages into files on disk.
///
/// Pages are processed strictly in order; the resources of one page are
/// downloaded with bounded concurrency and settle before the next page is
/// requested. A failed resource never affects any other resource.
pub struct Pipeline<'a> {
    normalizer: &'a TaxonomyNormalizer,
    paths: &'a PathBuilder,
    fetcher: &'a dyn ArtifactFetcher,
    concurrency: usize,
    skip_existing: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        normalizer: &'a TaxonomyNormalizer,
        paths: &'a PathBuilder,
        fetcher: &'a dyn ArtifactFetcher,
    ) -> Self {
        Self {
            normalizer,
            paths,
            fetcher,
            concurrency: 1,
            skip_existing: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Drain the paginator. Only catalogue errors are returned.
    pub async fn run(&self, paginator: &mut CatalogPaginator<'_>) -> Result<RunSummary> {
        let mut summary = RunSummary::start();

        while let Some(page) = paginator.next_page().await? {
            if page.outcome == PageOutcome::Records {
                summary.pages += 1;
            }
            summary.records += page.records.len();
            self.process_page(&page, &mut summary).await;
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }

    async fn process_page(&self, page: &PageResult, summary: &mut RunSummary) {
        let mut jobs: Vec<(Resource, String)> = Vec::new();

        for record in &page.records {
            let taxonomy = self.normalizer.normalize(&record.title);
            log::debug!("{} -> {}", record.title, taxonomy.subject());
            if !taxonomy.has_year() || !taxonomy.has_month() {
                log::info!(
                    "'{}' lacks a year or month; filing under {}_{}",
                    record.title,
                    taxonomy.year,
                    taxonomy.month
                );
            }

            for kind in ResourceKind::ALL {
                if record.reference(kind).is_none() {
                    log::info!("No {} for '{}'", kind, record.title);
                    summary.missing += 1;
                }
            }

            for resource in self.paths.resources(record, &taxonomy) {
                let Some(url) = resource.resolved_url.clone() else {
                    log::info!("Blank {} reference for '{}'", resource.kind, record.title);
                    summary.missing += 1;
                    continue;
                };
                if self.skip_existing && resource.local_path.exists() {
                    log::debug!("Exists, skipping {}", resource.local_path.display());
                    summary.skipped += 1;
                    continue;
                }
                jobs.push((resource, url));
            }
        }

        let mut downloads = stream::iter(group_by_path(jobs))
            .map(|group| async move {
                let mut results = Vec::with_capacity(group.len());
                for (resource, url) in group {
                    let result = self.fetcher.download(&url, &resource.local_path).await;
                    results.push((resource, url, result));
                }
                results
            })
            .buffer_unordered(self.concurrency);

        while let Some(results) = downloads.next().await {
            for (resource, url, result) in results {
                match result {
                    Ok(bytes) => {
                        summary.downloaded += 1;
                        summary.bytes += bytes;
                        log::info!("Saved {}", resource.local_path.display());
                    }
                    Err(error) => {
                        summary.failed += 1;
                        log::warn!("Failed {} {}: {}", resource.kind, url, error);
                    }
                }
            }
        }
    }
}

/// Group jobs that write the same file so they run one after another.
///
/// Groups keep first-seen order, and jobs keep their order within a group.
fn group_by_path(jobs: Vec<(Resource, String)>) -> Vec<Vec<(Resource, String)>> {
    let mut groups: Vec<Vec<(Resource, String)>> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for job in jobs {
        match index.get(&job.0.local_path) {
            Some(&i) => {
                log::warn!(
                    "{} is the target of several records; later downloads overwrite earlier ones",
                    job.0.local_path.display()
                );
                groups[i].push(job);
            }
            None => {
                index.insert(job.0.local_path.clone(), groups.len());
                groups.push(vec![job]);
            }
        }
    }
    groups
}

/// Cookie jar for the catalogue and artifact hosts, from a raw header value.
pub fn session_cookies(config: &Config, header: Option<&str>) -> Result<Option<Arc<Jar>>> {
    let Some(header) = header else {
        return Ok(None);
    };

    let pairs = parse_cookie_header(header);
    if pairs.is_empty() {
        log::warn!("Cookie header is empty; continuing without a session");
        return Ok(None);
    }

    let scopes = [
        Url::parse(&config.catalog.list_url)?,
        Url::parse(&config.catalog.base_url)?,
    ];
    log::debug!("Installing {} cookies", pairs.len());
    Ok(Some(build_jar(&pairs, &scopes)))
}

/// Run the full download pipeline for the configured selection.
pub async fn run_crawler(config: &Config, cookie_header: Option<&str>) -> Result<RunSummary> {
    config.validate()?;

    let grade = config.grade()?;
    let category = config.category()?;
    log::info!(
        "Crawling {} {} exams {}-{}",
        grade.name,
        category.name,
        config.catalog.begin_year,
        config.catalog.end_year
    );

    let client = create_async_client(&config.crawler, session_cookies(config, cookie_header)?)?;
    let extractor = ActionListExtractor::new(&config.extractor)?;
    let source = HttpCatalogSource::new(
        client.clone(),
        &config.catalog.list_url,
        config.filter_params()?,
        RetryPolicy::from_config(&config.crawler),
    );
    let normalizer = TaxonomyNormalizer::from_config(config)?;
    let paths = PathBuilder::from_config(config);
    let downloader = ArtifactDownloader::new(client, &config.crawler);

    let mut paginator = CatalogPaginator::new(&source, &extractor, &config.catalog)
        .with_delay(Duration::from_millis(config.crawler.request_delay_ms));
    if config.output.debug {
        paginator = paginator.with_dump_dir(paths.root().join("_debug"));
    }

    let summary = Pipeline::new(&normalizer, &paths, &downloader)
        .with_concurrency(config.crawler.max_concurrent)
        .with_skip_existing(config.output.skip_existing)
        .run(&mut paginator)
        .await?;

    summary.log();
    Ok(summary)
}
