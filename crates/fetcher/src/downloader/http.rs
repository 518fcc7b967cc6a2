//! HTTP downloader
//!
//! Streams a GET response body into a `.partial` file and renames it over
//! the target once the body has been consumed.

use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::files::fs_error;
use crate::downloader::core::{
    atomic_rename, partial_path, DownloadError, DownloadResult, FileOperation,
    HttpDownloadRequest, ProgressFactory, ProgressIndicator, ProgressSpec, Result,
};

/// HTTP client configured once and reused for every request
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    chunk_size: usize,
}

impl HttpDownloader {
    /// Create a new HTTP downloader from download configuration
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| DownloadError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            field: None,
        })?;

        Ok(Self {
            client,
            chunk_size: config.http_chunk_size,
        })
    }

    /// Download `request.url` to `request.target`
    ///
    /// Nothing is written unless the server answers `200 OK`. If the transfer
    /// fails after the body started streaming, the `.partial` file is left
    /// where it is.
    pub async fn download(
        &self,
        request: &HttpDownloadRequest,
        progress: &dyn ProgressFactory,
    ) -> Result<DownloadResult> {
        let url = request.url.as_str();
        let target = request.target.as_path();
        let temp_path = partial_path(target)?;

        info!("Downloading file from {} to {}", url, target.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(http_error(url))?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::RequestFailed {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total_size = content_length(response.headers());
        debug!("Content length: {:?}", total_size);

        let mut indicator = request.options.progress_bar.then(|| {
            progress.create(&ProgressSpec::bytes(
                total_size,
                request.options.description.clone(),
            ))
        });

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(fs_error(&temp_path, FileOperation::Create))?;

        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut downloaded: u64 = 0;

        // Frames arrive at whatever size the network delivers; regroup them
        // so every chunk but the last is exactly `chunk_size` bytes.
        while let Some(frame) = stream.next().await {
            let frame = frame.map_err(http_error(url))?;
            let mut rest: &[u8] = &frame;

            while !rest.is_empty() {
                let take = (self.chunk_size - pending.len()).min(rest.len());
                pending.extend_from_slice(&rest[..take]);
                rest = &rest[take..];

                if pending.len() == self.chunk_size {
                    write_chunk(&mut file, &mut indicator, &pending, &temp_path).await?;
                    downloaded += pending.len() as u64;
                    pending.clear();
                }
            }
        }

        if !pending.is_empty() {
            write_chunk(&mut file, &mut indicator, &pending, &temp_path).await?;
            downloaded += pending.len() as u64;
        }

        file.flush()
            .await
            .map_err(fs_error(&temp_path, FileOperation::Write))?;
        drop(file);

        info!("Moving file from {} to {}", temp_path.display(), target.display());
        atomic_rename(&temp_path, target).await?;

        if let Some(indicator) = indicator {
            indicator.close();
        }

        debug!("Stream download completed: {} bytes", downloaded);
        Ok(DownloadResult {
            path: target.to_path_buf(),
            size: downloaded,
            expected_size: total_size,
        })
    }
}

async fn write_chunk(
    file: &mut fs::File,
    indicator: &mut Option<Box<dyn ProgressIndicator>>,
    chunk: &[u8],
    temp_path: &Path,
) -> Result<()> {
    if let Some(indicator) = indicator.as_mut() {
        indicator.advance(chunk.len() as u64);
    }
    file.write_all(chunk)
        .await
        .map_err(fs_error(temp_path, FileOperation::Write))
}

fn http_error(url: &str) -> impl FnOnce(reqwest::Error) -> DownloadError + '_ {
    move |source| {
        if source.is_timeout() {
            DownloadError::NetworkTimeout {
                url: url.to_string(),
                source,
            }
        } else {
            DownloadError::HttpRequest {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Total size announced by the `Content-Length` header
///
/// Missing or malformed headers mean the size is unknown.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
