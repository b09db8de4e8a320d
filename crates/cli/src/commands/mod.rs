//! CLI command definitions and execution
//!
//! Each subcommand lives in its own module with an `execute` entry point
//! returning the process exit code.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use yd_core::{DiskClient, Error, Profile, ProfileManager, Result};
use yd_http::HttpTransport;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod disk;
mod download;
mod profile;
mod status;
mod upload;

/// yd - Yandex.Disk command-line client
///
/// Uploads and downloads files (with resume from a byte offset) and follows
/// asynchronous operations on the disk.
#[derive(Parser, Debug)]
#[command(name = "yd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Profile to load connection settings from
    #[arg(long, global = true, env = "YD_PROFILE", default_value = "default")]
    pub profile: String,

    /// OAuth token overriding the profile's token
    #[arg(long, global = true, env = "YD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// Show disk quota and owner
    Disk(disk::DiskArgs),

    /// Upload a local file, optionally resuming from a byte offset
    Upload(upload::UploadArgs),

    /// Download a file, optionally resuming from a byte offset
    Download(download::DownloadArgs),

    /// Query (or wait for) an asynchronous operation
    Status(status::StatusArgs),
}

/// Which profile to connect with and an optional token override
#[derive(Debug, Clone)]
pub struct Connection {
    pub profile: String,
    pub token: Option<String>,
}

impl Connection {
    /// Load the profile, applying the token override
    ///
    /// A token alone is enough: an unknown profile name then gets default
    /// endpoint settings.
    pub fn resolve(&self, manager: &ProfileManager) -> Result<Profile> {
        match (manager.get(&self.profile), &self.token) {
            (Ok(mut profile), Some(token)) => {
                profile.token = token.clone();
                Ok(profile)
            }
            (Ok(profile), None) => Ok(profile),
            (Err(Error::ProfileNotFound(_)), Some(token)) => {
                Ok(Profile::new(self.profile.clone(), token.clone()))
            }
            (Err(e), _) => Err(e),
        }
    }

    /// Build a client over HTTP for the resolved profile
    pub fn connect(&self) -> Result<(DiskClient, Profile)> {
        let manager = ProfileManager::new()?;
        let profile = self.resolve(&manager)?;
        let transport = HttpTransport::from_profile(&profile)?;
        let client = DiskClient::new(profile.client_config(), Arc::new(transport))?;
        tracing::debug!(profile = %profile.name, "connected");
        Ok((client, profile))
    }
}

/// Print an error and map it to its exit code
pub(crate) fn report(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from(error)
}

/// Split `--fields` values into the borrowed form the client takes
pub(crate) fn field_refs(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };
    let connection = Connection {
        profile: cli.profile,
        token: cli.token,
    };

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Disk(args) => disk::execute(args, &connection, output_config).await,
        Commands::Upload(args) => upload::execute(args, &connection, output_config).await,
        Commands::Download(args) => download::execute(args, &connection, output_config).await,
        Commands::Status(args) => status::execute(args, &connection, output_config).await,
    }
}
