//! `fetch`: stage a remote file on local disk
//!
//! ```text
//! fetch https://example.com/weights.pt ./weights.pt
//! fetch ftp://ftp.example.com/pub/catalog.csv ./catalog.csv --user alice --password secret
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use fetcher::{DownloadConfig, DownloadError, DownloadOptions, DownloadSource, Downloader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "fetch", version)]
#[command(about = "Download a file over HTTP(S) or FTP and move it into place atomically")]
struct Cli {
    /// http://, https:// or ftp:// URL of the file
    source: String,

    /// Destination file; its directory must exist
    target: PathBuf,

    /// Do not draw a progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Label shown next to the progress bar
    #[arg(long, default_value = "Downloading")]
    desc: String,

    /// FTP user (overrides the URL)
    #[arg(long)]
    user: Option<String>,

    /// FTP password (overrides the URL)
    #[arg(long)]
    password: Option<String>,

    /// FTP read block size in bytes
    #[arg(long)]
    blocksize: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<DownloadError>() {
                Some(download_err) => eprint!("{}", download_err.detailed_report()),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = DownloadConfig::from_env().context("reading FETCHER_* settings")?;
    let downloader = Downloader::new(config)?;

    let options = DownloadOptions::default()
        .with_progress_bar(!cli.no_progress)
        .with_description(cli.desc);

    let source = match DownloadSource::parse(&cli.source, &cli.target, options)? {
        DownloadSource::Ftp(mut request) => {
            if let Some(user) = cli.user {
                request.user = user;
            }
            if let Some(password) = cli.password {
                request.password = password;
            }
            if let Some(blocksize) = cli.blocksize {
                request.blocksize = blocksize;
            }
            DownloadSource::Ftp(request)
        }
        http => {
            if cli.user.is_some() || cli.password.is_some() || cli.blocksize.is_some() {
                tracing::warn!("--user, --password and --blocksize only apply to ftp:// sources");
            }
            http
        }
    };

    let result = downloader.download_source(&source).await?;
    tracing::info!("Saved {} bytes to {}", result.size, result.path.display());
    Ok(())
}
