//! FTP downloader
//!
//! The FTP client is synchronous. [`FtpDownloader::download`] moves the whole
//! transfer onto tokio's blocking pool; [`FtpDownloader::download_blocking`]
//! runs it on the calling thread.
//!
//! The control connection is owned by an [`FtpSession`] for the duration of a
//! transfer and is closed exactly once, whether the transfer succeeds or not.

use std::fs::File;
use std::io::{Read, Write};
use std::sync::Arc;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::{debug, info};

use crate::downloader::core::files::fs_error;
use crate::downloader::core::{
    atomic_rename_blocking, partial_path, DownloadError, DownloadResult, FileOperation,
    FtpDownloadRequest, FtpOperation, ProgressFactory, ProgressSpec, Result,
};

/// An authenticated FTP control connection
pub trait FtpTransport: Send {
    /// Switch to binary transfers (`TYPE I`)
    fn binary_mode(&mut self) -> Result<()>;

    /// Size of `path` in bytes as reported by `SIZE`
    fn size(&mut self, path: &str) -> Result<u64>;

    /// Retrieve `path`, handing each block of at most `blocksize` bytes to
    /// `on_chunk` in arrival order
    ///
    /// An error returned by `on_chunk` aborts the transfer and is returned
    /// unchanged.
    fn retrieve(
        &mut self,
        path: &str,
        blocksize: usize,
        on_chunk: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()>;

    /// Say goodbye and drop the connection
    fn quit(&mut self) -> Result<()>;
}

/// Opens FTP control connections
pub trait FtpConnector: Send + Sync {
    fn connect(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn FtpTransport>>;
}

/// [`FtpConnector`] backed by `suppaftp`'s plain (non-TLS) client
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppaFtpConnector;

impl FtpConnector for SuppaFtpConnector {
    fn connect(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn FtpTransport>> {
        debug!("Connecting to FTP server {}:{}", host, port);
        let mut stream = FtpStream::connect((host, port))
            .map_err(ftp_error(host, FtpOperation::Connect))?;

        if let Err(e) = stream.login(user, password) {
            let _ = stream.quit();
            return Err(ftp_error(host, FtpOperation::Login)(e));
        }

        Ok(Box::new(SuppaFtpTransport {
            host: host.to_string(),
            stream,
        }))
    }
}

struct SuppaFtpTransport {
    host: String,
    stream: FtpStream,
}

impl FtpTransport for SuppaFtpTransport {
    fn binary_mode(&mut self) -> Result<()> {
        self.stream
            .transfer_type(FileType::Binary)
            .map_err(ftp_error(&self.host, FtpOperation::TransferType))
    }

    fn size(&mut self, path: &str) -> Result<u64> {
        self.stream
            .size(path)
            .map(|size| size as u64)
            .map_err(ftp_error(&self.host, FtpOperation::Size))
    }

    fn retrieve(
        &mut self,
        path: &str,
        blocksize: usize,
        on_chunk: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        let host = self.host.as_str();
        let mut data = self
            .stream
            .retr_as_stream(path)
            .map_err(ftp_error(host, FtpOperation::Retrieve))?;

        let mut buf = vec![0u8; blocksize];
        loop {
            let n = match data.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ftp_error(host, FtpOperation::Retrieve)(
                        FtpError::ConnectionError(e),
                    ));
                }
            };
            on_chunk(&buf[..n])?;
        }

        self.stream
            .finalize_retr_stream(data)
            .map_err(ftp_error(host, FtpOperation::Retrieve))
    }

    fn quit(&mut self) -> Result<()> {
        self.stream
            .quit()
            .map_err(ftp_error(&self.host, FtpOperation::Quit))
    }
}

fn ftp_error(host: &str, operation: FtpOperation) -> impl FnOnce(FtpError) -> DownloadError + '_ {
    move |source| DownloadError::Ftp {
        host: host.to_string(),
        operation,
        source,
    }
}

/// Scoped ownership of an FTP control connection
///
/// The connection is closed by [`FtpSession::close`] or, on early return, by
/// `Drop`. Either way `QUIT` is sent once; its failure is only logged since
/// the socket goes away regardless.
pub struct FtpSession {
    host: String,
    transport: Box<dyn FtpTransport>,
    closed: bool,
}

impl FtpSession {
    pub fn open(connector: &dyn FtpConnector, request: &FtpDownloadRequest) -> Result<Self> {
        let transport = connector.connect(
            &request.host,
            request.port,
            &request.user,
            &request.password,
        )?;
        Ok(Self {
            host: request.host.clone(),
            transport,
            closed: false,
        })
    }

    pub fn transport(&mut self) -> &mut dyn FtpTransport {
        self.transport.as_mut()
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.transport.quit() {
            Ok(()) => debug!("Closed FTP connection to {}", self.host),
            Err(e) => debug!("Error while closing FTP connection to {}: {}", self.host, e),
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// FTP downloader using a pluggable [`FtpConnector`]
#[derive(Clone)]
pub struct FtpDownloader {
    connector: Arc<dyn FtpConnector>,
}

impl std::fmt::Debug for FtpDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpDownloader").finish_non_exhaustive()
    }
}

impl Default for FtpDownloader {
    fn default() -> Self {
        Self::new(Arc::new(SuppaFtpConnector))
    }
}

impl FtpDownloader {
    pub fn new(connector: Arc<dyn FtpConnector>) -> Self {
        Self { connector }
    }

    /// Download on tokio's blocking pool
    ///
    /// The caller's `tracing` dispatcher follows the transfer onto the
    /// blocking thread.
    pub async fn download(
        &self,
        request: &FtpDownloadRequest,
        progress: Arc<dyn ProgressFactory>,
    ) -> Result<DownloadResult> {
        let downloader = self.clone();
        let request = request.clone();
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());

        tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                downloader.download_blocking(&request, progress.as_ref())
            })
        })
        .await
        .map_err(|source| DownloadError::TaskFailed { source })?
    }

    /// Download `request.file` from `request.host` to `request.target`
    ///
    /// If the server cannot report the file size the transfer goes ahead with
    /// an unknown total. On failure the `.partial` file is left behind.
    pub fn download_blocking(
        &self,
        request: &FtpDownloadRequest,
        progress: &dyn ProgressFactory,
    ) -> Result<DownloadResult> {
        if request.blocksize == 0 {
            return Err(DownloadError::Configuration {
                message: "FTP block size must be greater than zero".to_string(),
                field: Some("blocksize".to_string()),
            });
        }

        let target = request.target.as_path();
        let temp_path = partial_path(target)?;

        info!("Downloading {} to {}", request.display_url(), target.display());

        let mut session = FtpSession::open(self.connector.as_ref(), request)?;
        let ftp = session.transport();

        ftp.binary_mode()?;

        let total_size = match ftp.size(&request.file) {
            Ok(size) => Some(size),
            Err(e) => {
                debug!("Size of {} unknown: {}", request.file, e);
                None
            }
        };

        let mut indicator = request.options.progress_bar.then(|| {
            progress.create(&ProgressSpec::bytes(
                total_size,
                request.options.description.clone(),
            ))
        });

        let mut file =
            File::create(&temp_path).map_err(fs_error(&temp_path, FileOperation::Create))?;
        let mut downloaded: u64 = 0;

        ftp.retrieve(&request.file, request.blocksize, &mut |chunk: &[u8]| {
            if let Some(indicator) = indicator.as_mut() {
                indicator.advance(chunk.len() as u64);
            }
            file.write_all(chunk)
                .map_err(fs_error(&temp_path, FileOperation::Write))?;
            downloaded += chunk.len() as u64;
            Ok(())
        })?;

        file.flush().map_err(fs_error(&temp_path, FileOperation::Write))?;
        drop(file);

        info!("Moving file from {} to {}", temp_path.display(), target.display());
        atomic_rename_blocking(&temp_path, target)?;

        if let Some(indicator) = indicator {
            indicator.close();
        }
        session.close();

        debug!("FTP download completed: {} bytes", downloaded);
        Ok(DownloadResult {
            path: target.to_path_buf(),
            size: downloaded,
            expected_size: total_size,
        })
    }
}
