//! Core types used throughout the downloader system
//!
//! This module contains the fundamental types that all other modules depend on.
//! By organizing these in a core module, we make the dependency relationships clear.

pub mod error;
pub mod files;
pub mod progress;

// Re-export main types for convenience
pub use error::{DownloadError, ErrorKind, FileOperation, FtpOperation, Result};
pub use files::{atomic_rename, atomic_rename_blocking, partial_path, PARTIAL_SUFFIX};
pub use progress::{
    CallbackProgressFactory, ConsoleProgressFactory, ProgressCallback, ProgressEvent,
    ProgressFactory, ProgressIndicator, ProgressSpec, BYTES_UNIT,
};

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

pub const DEFAULT_DESCRIPTION: &str = "Downloading";
pub const DEFAULT_FTP_USER: &str = "anonymous";
pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_FTP_BLOCKSIZE: usize = 8192;

/// Presentation flags shared by every kind of request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub progress_bar: bool,
    /// Label shown next to the progress bar
    pub description: String,
}

impl DownloadOptions {
    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            progress_bar: true,
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// A streaming HTTP(S) GET whose body ends up at `target`
#[derive(Debug, Clone)]
pub struct HttpDownloadRequest {
    pub url: String,
    /// Destination file; its parent directory must already exist
    pub target: PathBuf,
    pub options: DownloadOptions,
}

impl HttpDownloadRequest {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(url: S, target: P) -> Self {
        Self {
            url: url.into(),
            target: target.into(),
            options: DownloadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.options.progress_bar = enabled;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.options.description = description.into();
        self
    }
}

/// A binary RETR of `file` from `host` whose data ends up at `target`
#[derive(Debug, Clone)]
pub struct FtpDownloadRequest {
    pub host: String,
    pub port: u16,
    /// Remote path, passed to RETR as is
    pub file: String,
    /// Destination file; its parent directory must already exist
    pub target: PathBuf,
    pub user: String,
    pub password: String,
    /// Maximum number of bytes read from the data connection at once
    pub blocksize: usize,
    pub options: DownloadOptions,
}

impl FtpDownloadRequest {
    pub fn new<H, F, P>(host: H, file: F, target: P) -> Self
    where
        H: Into<String>,
        F: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            host: host.into(),
            port: DEFAULT_FTP_PORT,
            file: file.into(),
            target: target.into(),
            user: DEFAULT_FTP_USER.to_string(),
            password: String::new(),
            blocksize: DEFAULT_FTP_BLOCKSIZE,
            options: DownloadOptions::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials<U: Into<String>, P: Into<String>>(
        mut self,
        user: U,
        password: P,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_blocksize(mut self, blocksize: usize) -> Self {
        self.blocksize = blocksize;
        self
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.options.progress_bar = enabled;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.options.description = description.into();
        self
    }

    /// `ftp://host:port/file`, for log messages
    pub fn display_url(&self) -> String {
        format!(
            "ftp://{}:{}/{}",
            self.host,
            self.port,
            self.file.trim_start_matches('/')
        )
    }
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Final location of the file
    pub path: PathBuf,
    /// Bytes written
    pub size: u64,
    /// Size announced by the server, if any
    pub expected_size: Option<u64>,
}

/// A download request resolved from a URL
///
/// `http`/`https` URLs become HTTP requests; `ftp` URLs are split into host,
/// port, credentials and remote path.
#[derive(Debug, Clone)]
pub enum DownloadSource {
    Http(HttpDownloadRequest),
    Ftp(FtpDownloadRequest),
}

pub const SUPPORTED_SCHEMES: &str = "http, https, ftp";

impl DownloadSource {
    pub fn parse<P: AsRef<Path>>(url: &str, target: P, options: DownloadOptions) -> Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| match DownloadError::from(e) {
            DownloadError::InvalidUrl { suggestion, source, .. } => DownloadError::InvalidUrl {
                url: url.to_string(),
                suggestion,
                source,
            },
            other => other,
        })?;
        let target = target.as_ref().to_path_buf();

        match parsed.scheme() {
            "http" | "https" => Ok(DownloadSource::Http(
                HttpDownloadRequest::new(url, target).with_options(options),
            )),
            "ftp" => {
                let host = parsed
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| DownloadError::InvalidUrl {
                        url: url.to_string(),
                        suggestion: "FTP URLs must name a host".to_string(),
                        source: None,
                    })?;

                let file = percent_decode(parsed.path().trim_start_matches('/'));
                if file.is_empty() {
                    return Err(DownloadError::InvalidUrl {
                        url: url.to_string(),
                        suggestion: "FTP URLs must include the path of the remote file".to_string(),
                        source: None,
                    });
                }

                let mut request = FtpDownloadRequest::new(host, file, target)
                    .with_port(parsed.port().unwrap_or(DEFAULT_FTP_PORT))
                    .with_options(options);

                if !parsed.username().is_empty() {
                    request = request.with_credentials(
                        percent_decode(parsed.username()),
                        percent_decode(parsed.password().unwrap_or_default()),
                    );
                }

                Ok(DownloadSource::Ftp(request))
            }
            scheme => Err(DownloadError::UnsupportedUrl {
                url: url.to_string(),
                scheme: scheme.to_string(),
                supported_schemes: SUPPORTED_SCHEMES.to_string(),
            }),
        }
    }

    pub fn target(&self) -> &Path {
        match self {
            DownloadSource::Http(request) => &request.target,
            DownloadSource::Ftp(request) => &request.target,
        }
    }
}

/// URL components arrive percent-encoded; FTP commands need the raw text
fn percent_decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}
