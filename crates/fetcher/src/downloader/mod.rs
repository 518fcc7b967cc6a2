//! Downloader module
//!
//! Two leaf operations, HTTP and FTP, each writing into a `.partial` file and
//! renaming it into place on success. [`Downloader`] bundles them with a
//! shared configuration and progress factory.

pub mod config;
pub mod core;
pub mod ftp;
pub mod http;

// Re-export main types for convenience
pub use config::DownloadConfig;
pub use self::core::{
    CallbackProgressFactory, ConsoleProgressFactory, DownloadError, DownloadOptions,
    DownloadResult, DownloadSource, ErrorKind, FileOperation, FtpDownloadRequest, FtpOperation,
    HttpDownloadRequest, ProgressCallback, ProgressEvent, ProgressFactory, ProgressIndicator,
    ProgressSpec, Result,
};
pub use ftp::{FtpConnector, FtpDownloader, FtpSession, FtpTransport, SuppaFtpConnector};
pub use http::HttpDownloader;

use std::path::Path;
use std::sync::Arc;

/// Entry point bundling both downloaders
///
/// Progress is drawn on the console unless another [`ProgressFactory`] is
/// supplied with [`Downloader::with_progress_factory`].
pub struct Downloader {
    config: DownloadConfig,
    http: HttpDownloader,
    ftp: FtpDownloader,
    progress: Arc<dyn ProgressFactory>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let http = HttpDownloader::new(&config)?;
        Ok(Self {
            config,
            http,
            ftp: FtpDownloader::default(),
            progress: Arc::new(ConsoleProgressFactory),
        })
    }

    pub fn with_progress_factory(mut self, progress: Arc<dyn ProgressFactory>) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the FTP client, e.g. to route through a different library
    pub fn with_ftp_connector(mut self, connector: Arc<dyn FtpConnector>) -> Self {
        self.ftp = FtpDownloader::new(connector);
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub async fn download_http(&self, request: &HttpDownloadRequest) -> Result<DownloadResult> {
        self.http.download(request, self.progress.as_ref()).await
    }

    pub async fn download_ftp(&self, request: &FtpDownloadRequest) -> Result<DownloadResult> {
        self.ftp.download(request, self.progress.clone()).await
    }

    /// Download any supported URL, picking the protocol from its scheme
    pub async fn download_url<P: AsRef<Path>>(
        &self,
        url: &str,
        target: P,
        options: DownloadOptions,
    ) -> Result<DownloadResult> {
        self.download_source(&DownloadSource::parse(url, target, options)?).await
    }

    pub async fn download_source(&self, source: &DownloadSource) -> Result<DownloadResult> {
        match source {
            DownloadSource::Http(request) => self.download_http(request).await,
            DownloadSource::Ftp(request) => self.download_ftp(request).await,
        }
    }
}
