// src/services/downloader.rs

//! Streaming artifact downloads.
//!
//! Bodies are written to `<dest>.part` and renamed once complete, so a
//! partially written file never sits at a final path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

const BAR_TEMPLATE: &str =
    "{msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:30!} {bytes} ({bytes_per_sec})";

/// Fetches one artifact to a local path.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// HTTP downloader with chunked writes and optional progress bars.
pub struct ArtifactDownloader {
    client: Client,
    chunk_size: usize,
    timeout: Duration,
    progress: Option<MultiProgress>,
}

impl ArtifactDownloader {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            chunk_size: config.chunk_size.max(1),
            timeout: Duration::from_secs(config.download_timeout_secs),
            progress: config.show_progress.then(MultiProgress::new),
        }
    }

    fn progress_bar(&self, len: Option<u64>, dest: &Path) -> ProgressBar {
        let Some(multi) = &self.progress else {
            return ProgressBar::hidden();
        };

        let bar = match len {
            Some(len) => {
                let bar = multi.add(ProgressBar::new(len));
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = multi.add(ProgressBar::new_spinner());
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(name);
        bar
    }

    async fn stream_to(&self, url: &str, dest: &Path, part: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::download(url, e))?;

        let bar = self.progress_bar(response.content_length(), dest);
        let file = File::create(part).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::download(url, e))?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
            bar.set_position(written);
        }

        writer.flush().await?;
        bar.finish_and_clear();
        Ok(written)
    }
}

#[async_trait]
impl ArtifactFetcher for ArtifactDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let part = part_path(dest);
        match self.stream_to(url, dest, &part).await {
            Ok(written) => {
                fs::rename(&part, dest).await?;
                log::debug!("Saved {} ({} bytes)", dest.display(), written);
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Could not remove {}: {}", part.display(), cleanup);
                    }
                }
                Err(e)
            }
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::create_async_client;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the URL to request.
    async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/file.pdf")
    }

    fn downloader() -> ArtifactDownloader {
        let config = CrawlerConfig {
            show_progress: false,
            chunk_size: 4,
            ..CrawlerConfig::default()
        };
        let client = create_async_client(&config, None).unwrap();
        ArtifactDownloader::new(client, &config)
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("out/a.pdf")),
            PathBuf::from("out/a.pdf.part")
        );
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let url = serve_once("200 OK", b"%PDF-1.4 body").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("a.pdf");

        let written = downloader().download(&url, &dest).await.unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.4 body");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_http_error_leaves_nothing_behind() {
        let url = serve_once("404 Not Found", b"missing").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.pdf");

        let err = downloader().download(&url, &dest).await.unwrap_err();

        assert!(matches!(err, AppError::Download { .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
