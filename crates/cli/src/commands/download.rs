//! download command - Fetch a file from the disk
//!
//! Without `--offset` the local file is replaced. With `--offset N` the first
//! N bytes of the local file are kept and the rest is fetched and appended.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use yd_core::{DiskClient, DiskPath, Error, Result, TransferLink};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, ProgressWriter, format_size};

use super::{Connection, report};

/// Download a file
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Path on the disk (e.g. "/app/report.pdf")
    pub source: String,

    /// Local file to write; an existing directory receives the remote file name
    pub target: PathBuf,

    /// Resume: keep this many bytes of the local file and fetch the rest
    #[arg(long)]
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    source: String,
    target: String,
    offset: u64,
    bytes_transferred: u64,
    size_human: String,
}

/// Execute the download command
pub async fn execute(args: DownloadArgs, connection: &Connection, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let target = match local_target(&args.source, &args.target) {
        Ok(target) => target,
        Err(e) => return report(&formatter, "Invalid target", &e),
    };

    let (client, _profile) = match connection.connect() {
        Ok(connected) => connected,
        Err(e) => return report(&formatter, "Failed to create client", &e),
    };

    let link = match client.resolve_download_link(&args.source, &[]).await {
        Ok(link) => link,
        Err(e) => return report(&formatter, "Failed to get download link", &e),
    };

    let progress = ProgressBar::spinner(&output_config, &format!("Downloading {}", args.source));
    let outcome = match args.offset {
        Some(offset) => resume(&client, &link, &target, offset, &progress).await,
        None => fetch_whole(&client, &link, &target, &progress).await,
    };
    progress.finish_and_clear();

    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(e) => return report(&formatter, "Download failed", &e),
    };
    let offset = args.offset.unwrap_or(0);

    if formatter.is_json() {
        formatter.json(&DownloadOutput {
            source: args.source,
            target: target.display().to_string(),
            offset,
            bytes_transferred: bytes,
            size_human: format_size(offset + bytes),
        });
    } else {
        formatter.success(&format!(
            "{} -> {} ({} received, {} total)",
            args.source,
            target.display(),
            format_size(bytes),
            format_size(offset + bytes)
        ));
    }

    ExitCode::Success
}

/// Local file to write, naming it after the remote file when `target` is a directory
fn local_target(source: &str, target: &Path) -> Result<PathBuf> {
    let source = DiskPath::parse(source)?;
    if !target.is_dir() {
        return Ok(target.to_path_buf());
    }
    let name = source.file_name().ok_or_else(|| {
        Error::Validation(format!("'{source}' has no file name to save under"))
    })?;
    Ok(target.join(name))
}

async fn fetch_whole(
    client: &DiskClient,
    link: &TransferLink,
    target: &Path,
    progress: &ProgressBar,
) -> Result<u64> {
    let file = tokio::fs::File::create(target).await?;
    let mut writer = ProgressWriter::new(file, progress);
    let result = client.download_to(link, &mut writer).await?;
    writer.flush().await?;
    Ok(result.bytes_transferred)
}

async fn resume(
    client: &DiskClient,
    link: &TransferLink,
    target: &Path,
    offset: u64,
    progress: &ProgressBar,
) -> Result<u64> {
    let mut file = open_at_offset(target, offset).await?;
    let tail = client.download_from(link, offset).await?;

    let mut writer = ProgressWriter::new(&mut file, progress);
    writer.write_all(&tail).await?;
    writer.flush().await?;
    Ok(tail.len() as u64)
}

/// Open the partial local file, truncated to exactly `offset` bytes
async fn open_at_offset(target: &Path, offset: u64) -> Result<tokio::fs::File> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(target)
        .await?;

    let existing = file.metadata().await?.len();
    if existing < offset {
        return Err(Error::Validation(format!(
            "cannot resume at byte {offset}: {} holds only {existing} bytes",
            target.display()
        )));
    }

    file.set_len(offset).await?;
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    Ok(file)
}
