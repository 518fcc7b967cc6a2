//! Fetcher Library
//!
//! Stages remote artifacts (datasets, model weights) on local disk. A file is
//! fetched over HTTP(S) or FTP into a `.partial` sibling of its destination
//! and renamed into place only once the transfer has completed, so the
//! destination never holds a half-written file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fetcher::{DownloadConfig, Downloader, FtpDownloadRequest, HttpDownloadRequest};
//!
//! # async fn example() -> fetcher::Result<()> {
//! let downloader = Downloader::new(DownloadConfig::default())?;
//!
//! let request = HttpDownloadRequest::new("https://example.com/weights.pt", "/data/weights.pt")
//!     .with_description("weights");
//! let result = downloader.download_http(&request).await?;
//! println!("{} bytes written to {}", result.size, result.path.display());
//!
//! let request = FtpDownloadRequest::new("ftp.example.com", "pub/catalog.csv", "/data/catalog.csv")
//!     .with_progress_bar(false);
//! downloader.download_ftp(&request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Log lines are emitted through `tracing`; install a subscriber to see them.

pub mod downloader;

// Re-export commonly used types for convenience
pub use downloader::{
    CallbackProgressFactory, ConsoleProgressFactory, DownloadConfig, DownloadError,
    DownloadOptions, DownloadResult, DownloadSource, Downloader, ErrorKind, FtpDownloadRequest,
    HttpDownloadRequest, ProgressCallback, ProgressEvent, ProgressFactory, Result,
};

/// Download one file over HTTP(S) with the default configuration
pub async fn download_http(request: &HttpDownloadRequest) -> Result<DownloadResult> {
    Downloader::new(DownloadConfig::default())?
        .download_http(request)
        .await
}

/// Download one file over FTP with the default configuration
pub async fn download_ftp(request: &FtpDownloadRequest) -> Result<DownloadResult> {
    Downloader::new(DownloadConfig::default())?
        .download_ftp(request)
        .await
}
