// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create the shared asynchronous HTTP client.
///
/// Every configured header is sent by default. When a cookie jar is given it
/// is installed as the session store; requests are otherwise anonymous.
pub fn create_async_client(
    config: &CrawlerConfig,
    cookies: Option<Arc<Jar>>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(default_headers(config)?)
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(jar) = cookies {
        builder = builder.cookie_provider(jar);
    }

    Ok(builder.build()?)
}

fn default_headers(config: &CrawlerConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("Invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_builds() {
        assert!(create_async_client(&CrawlerConfig::default(), None).is_ok());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = CrawlerConfig::default();
        config
            .headers
            .insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(
            create_async_client(&config, None),
            Err(AppError::Config(_))
        ));
    }
}
