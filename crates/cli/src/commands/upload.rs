//! upload command - Send a local file to the disk
//!
//! A fresh upload resolves a link and sends the whole file. An interrupted
//! upload is resumed with `--offset`, ideally together with `--link` so the
//! same server-side operation continues.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use yd_core::{DiskClient, DiskPath, Error, OperationState, Profile, Result, TransferLink};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, format_size};
use crate::poll::wait_for_operation;

use super::{Connection, report};

/// Upload a local file
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to read
    pub source: PathBuf,

    /// Destination path on the disk (e.g. "/app/report.pdf" or "disk:/docs/a.txt").
    /// A trailing slash uploads into that folder under the local file name.
    pub target: String,

    /// Replace an existing resource at the destination
    #[arg(long)]
    pub overwrite: bool,

    /// Resume: send the file from this byte offset onwards
    #[arg(long)]
    pub offset: Option<u64>,

    /// Reuse a previously resolved upload link instead of resolving a new one
    #[arg(long, requires = "operation_id")]
    pub link: Option<String>,

    /// Operation id belonging to `--link`
    #[arg(long, requires = "link")]
    pub operation_id: Option<String>,

    /// Wait for the server-side operation to finish
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    source: String,
    target: String,
    href: String,
    operation_id: String,
    offset: u64,
    size_bytes: u64,
    bytes_transferred: u64,
    size_human: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_status: Option<OperationState>,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, connection: &Connection, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let target = match remote_target(&args.source, &args.target) {
        Ok(target) => target,
        Err(e) => return report(&formatter, "Invalid destination", &e),
    };

    let data = match tokio::fs::read(&args.source).await {
        Ok(data) => data,
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", args.source.display()));
            return ExitCode::GeneralError;
        }
    };
    let size = data.len() as u64;

    let (client, profile) = match connection.connect() {
        Ok(connected) => connected,
        Err(e) => return report(&formatter, "Failed to create client", &e),
    };

    let link = match reuse_link(&args) {
        Some(link) => link,
        None => match client.resolve_upload_link(target.as_str(), &[], args.overwrite).await {
            Ok(link) => link,
            Err(e) => return report(&formatter, "Failed to get upload link", &e),
        },
    };
    tracing::debug!(href = %link.href, operation_id = %link.operation_id, "upload link ready");

    let offset = args.offset.unwrap_or(0);
    let progress = ProgressBar::new(&output_config, size);
    progress.set_position(offset.min(size));

    let result = match args.offset {
        Some(offset) => client.upload_partial(&link, data, offset).await,
        None => client.upload_full(&link, data).await,
    };
    progress.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            if !formatter.is_json() && e.is_retryable() {
                formatter.warning(&format!(
                    "Resume with: --link '{}' --operation-id '{}' --offset <bytes accepted>",
                    link.href, link.operation_id
                ));
            }
            return report(&formatter, "Upload failed", &e);
        }
    };

    let operation_status = if args.wait && !link.operation_id.is_empty() {
        match wait(&client, &profile, &link, &output_config).await {
            Ok(state) => Some(state),
            Err(code) => return code,
        }
    } else {
        None
    };

    if formatter.is_json() {
        formatter.json(&UploadOutput {
            source: args.source.display().to_string(),
            target: target.to_string(),
            href: link.href.clone(),
            operation_id: link.operation_id.clone(),
            offset,
            size_bytes: size,
            bytes_transferred: result.bytes_transferred,
            size_human: format_size(size),
            status: result.status.to_string(),
            operation_status,
        });
    } else {
        formatter.success(&format!(
            "{} -> {} ({}, {} sent, {})",
            args.source.display(),
            target,
            format_size(size),
            format_size(result.bytes_transferred),
            result.status
        ));
        if !link.operation_id.is_empty() && operation_status.is_none() {
            formatter.println(&format!("Operation: {}", link.operation_id));
        }
    }

    match operation_status {
        Some(OperationState::Failed) => {
            formatter.error(&format!("Operation {} failed", link.operation_id));
            ExitCode::OperationFailed
        }
        _ => ExitCode::Success,
    }
}

/// Destination on the disk, with the local file name appended for folder targets
fn remote_target(source: &Path, target: &str) -> Result<DiskPath> {
    let target = DiskPath::parse(target)?;
    if !target.is_dir() {
        return Ok(target);
    }
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::Validation(format!(
                "cannot derive a file name from {}",
                source.display()
            ))
        })?;
    target.join(name)
}

/// Link from `--link`/`--operation-id`, when given
fn reuse_link(args: &UploadArgs) -> Option<TransferLink> {
    let href = args.link.clone()?;
    Some(TransferLink {
        href,
        method: "PUT".to_string(),
        templated: false,
        operation_id: args.operation_id.clone().unwrap_or_default(),
    })
}

async fn wait(
    client: &DiskClient,
    profile: &Profile,
    link: &TransferLink,
    output_config: &OutputConfig,
) -> std::result::Result<OperationState, ExitCode> {
    let formatter = Formatter::new(output_config.clone());
    let spinner = ProgressBar::spinner(output_config, "Waiting for the disk to store the file");

    let outcome = wait_for_operation(
        client,
        &link.operation_id,
        &[],
        &profile.poll_config(),
        |attempt, status| spinner.set_message(&format!("Operation {} (check {attempt})", status.status)),
    )
    .await;
    spinner.finish_and_clear();

    outcome
        .map(|status| status.status)
        .map_err(|e| report(&formatter, "Failed to wait for operation", &e))
}
