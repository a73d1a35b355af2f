// src/services/catalog.rs

//! HTTP catalogue source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, FilterParams};
use crate::services::PageSource;

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    /// Whether a failed request is worth repeating.
    pub fn is_transient(error: &reqwest::Error) -> bool {
        if error.is_timeout() || error.is_connect() {
            return true;
        }
        error.status().is_some_and(Self::is_transient_status)
    }

    pub fn is_transient_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

/// Catalogue pages fetched with a form-encoded POST.
pub struct HttpCatalogSource {
    client: Client,
    list_url: String,
    params: FilterParams,
    retry: RetryPolicy,
}

impl HttpCatalogSource {
    pub fn new(
        client: Client,
        list_url: impl Into<String>,
        params: FilterParams,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            list_url: list_url.into(),
            params,
            retry,
        }
    }

    async fn fetch_once(&self, page: u32) -> std::result::Result<String, reqwest::Error> {
        let response = self
            .client
            .post(&self.list_url)
            .form(&self.params.to_form(page))
            .send()
            .await?
            .error_for_status()?;

        log::debug!(
            "Page {} status: {} | content-type: {}",
            page,
            response.status(),
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
        );

        response.text().await
    }
}

#[async_trait]
impl PageSource for HttpCatalogSource {
    async fn fetch(&self, page: u32) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(page).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.retry.max_retries && RetryPolicy::is_transient(&e) => {
                    let backoff = self.retry.backoff(attempt);
                    log::warn!(
                        "Page {} request failed (attempt {}/{}), retrying in {:.1}s: {}",
                        page,
                        attempt + 1,
                        self.retry.max_retries + 1,
                        backoff.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(AppError::catalog(page, e)),
            }
        }
    }
}
