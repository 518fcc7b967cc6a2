//! Error types for the downloader system with context for the caller

use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while staging a remote file
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The server answered, but not with `200 OK`
    #[error("Request to '{url}' returned status code {status}")]
    RequestFailed {
        url: String,
        status: u16,
    },

    /// HTTP transport errors (connect, DNS, broken body stream)
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to '{url}' timed out")]
    NetworkTimeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// FTP control or data connection errors
    #[error("FTP {operation} on '{host}' failed")]
    Ftp {
        host: String,
        operation: FtpOperation,
        #[source]
        source: suppaftp::FtpError,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// The target has no file name to derive the `.partial` sibling from
    #[error("Target path '{path}' does not name a file")]
    InvalidTarget {
        path: PathBuf,
    },

    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("Unsupported URL scheme in '{url}' (supported: {supported_schemes})")]
    UnsupportedUrl {
        url: String,
        scheme: String,
        supported_schemes: String,
    },

    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// The blocking FTP task panicked or was cancelled
    #[error("Download task failed")]
    TaskFailed {
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Write,
    Move,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Move => write!(f, "moving"),
        }
    }
}

/// FTP protocol steps, for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpOperation {
    Connect,
    Login,
    TransferType,
    Size,
    Retrieve,
    Quit,
}

impl std::fmt::Display for FtpOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FtpOperation::Connect => write!(f, "connect"),
            FtpOperation::Login => write!(f, "login"),
            FtpOperation::TransferType => write!(f, "TYPE I"),
            FtpOperation::Size => write!(f, "SIZE"),
            FtpOperation::Retrieve => write!(f, "RETR"),
            FtpOperation::Quit => write!(f, "QUIT"),
        }
    }
}

/// Coarse classification of a [`DownloadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote side rejected the request
    Request,
    /// Connection, DNS, timeout or transfer failure
    Network,
    /// Temporary file creation, write or rename failure
    FileSystem,
    /// Bad input: URL, target path or settings
    Configuration,
    Internal,
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::RequestFailed { .. } => ErrorKind::Request,
            DownloadError::HttpRequest { .. }
            | DownloadError::NetworkTimeout { .. }
            | DownloadError::Ftp { .. } => ErrorKind::Network,
            DownloadError::FileSystem { .. } => ErrorKind::FileSystem,
            DownloadError::InvalidTarget { .. }
            | DownloadError::InvalidUrl { .. }
            | DownloadError::UnsupportedUrl { .. }
            | DownloadError::Configuration { .. } => ErrorKind::Configuration,
            DownloadError::TaskFailed { .. } => ErrorKind::Internal,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::RequestFailed { .. } => "request_failed",
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::NetworkTimeout { .. } => "network_timeout",
            DownloadError::Ftp { .. } => "ftp",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::InvalidTarget { .. } => "invalid_target",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::UnsupportedUrl { .. } => "unsupported_url",
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::TaskFailed { .. } => "task_failed",
        }
    }

    /// HTTP status code carried by a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            DownloadError::RequestFailed { status, .. } => Some(*status),
            DownloadError::HttpRequest { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            DownloadError::RequestFailed { status: 404, .. } => {
                Some("Check that the URL points to an existing file")
            }
            DownloadError::RequestFailed { status: 401 | 403, .. } => {
                Some("The server refused access to this file")
            }
            DownloadError::NetworkTimeout { .. } => {
                Some("Check your internet connection or raise the configured timeout")
            }
            DownloadError::InvalidTarget { .. } => {
                Some("Pass a path that ends in a file name")
            }
            DownloadError::InvalidUrl { suggestion, .. } => Some(suggestion),
            DownloadError::UnsupportedUrl { .. } => {
                Some("Use an http://, https:// or ftp:// URL")
            }
            DownloadError::FileSystem { operation: FileOperation::Create, .. } => {
                Some("Make sure the target directory exists and is writable")
            }
            _ => None,
        }
    }

    /// Create a detailed error report for debugging
    pub fn detailed_report(&self) -> String {
        let mut report = format!("Error: {}\n", self);
        report.push_str(&format!("Category: {}\n", self.category()));
        report.push_str(&format!("Kind: {:?}\n", self.kind()));

        if let Some(suggestion) = self.suggestion() {
            report.push_str(&format!("Suggestion: {}\n", suggestion));
        }

        if let Some(source) = self.source() {
            report.push_str(&format!("Root cause: {}\n", source));
        }

        report
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(error: url::ParseError) -> Self {
        let suggestion = match error {
            url::ParseError::EmptyHost => "URL must have a valid hostname",
            url::ParseError::InvalidPort => "Port number must be between 1 and 65535",
            url::ParseError::InvalidIpv4Address => "Invalid IPv4 address format",
            url::ParseError::InvalidIpv6Address => "Invalid IPv6 address format",
            url::ParseError::RelativeUrlWithoutBase => {
                "URL must be absolute (include http://, https:// or ftp://)"
            }
            _ => "Check URL format and try again",
        }
        .to_string();

        DownloadError::InvalidUrl {
            url: "<unparseable>".to_string(),
            suggestion,
            source: Some(error),
        }
    }
}
