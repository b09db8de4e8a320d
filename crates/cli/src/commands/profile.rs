//! Profile management commands
//!
//! Profiles are named connection settings: OAuth token, endpoint, API
//! version and timeouts.

use clap::Subcommand;
use serde::Serialize;
use yd_core::{Profile, ProfileManager, TimeoutConfig};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::report;

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "default", "work")
    pub name: String,

    /// OAuth token
    pub token: String,

    /// API endpoint
    #[arg(long, default_value = yd_core::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// API version
    #[arg(long, default_value_t = yd_core::DEFAULT_API_VERSION)]
    pub api_version: u32,

    /// Connection timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Whole-request timeout in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including endpoints and timeouts
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// JSON output for profile list
#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for output, token masked
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    token: String,
    base_url: String,
    api_version: u32,
    connect_timeout_ms: u64,
    request_timeout_ms: u64,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        let timeout = profile.timeout_config();
        Self {
            name: profile.name.clone(),
            token: profile.masked_token(),
            base_url: profile.base_url.clone(),
            api_version: profile.api_version,
            connect_timeout_ms: timeout.connect_ms,
            request_timeout_ms: timeout.request_ms,
        }
    }
}

/// JSON output for profile set/remove operations
#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ProfileManager::new() {
        Ok(manager) => manager,
        Err(e) => return report(&formatter, "Failed to load profiles", &e),
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn build_profile(args: SetArgs) -> Result<Profile, String> {
    if args.name.trim().is_empty() {
        return Err("Profile name cannot be empty".into());
    }
    if !args.base_url.starts_with("http://") && !args.base_url.starts_with("https://") {
        return Err("Base URL must start with http:// or https://".into());
    }
    if args.api_version == 0 {
        return Err("API version must be at least 1".into());
    }

    let mut profile = Profile::new(args.name, args.token);
    profile.base_url = args.base_url.trim_end_matches('/').to_string();
    profile.api_version = args.api_version;

    if args.connect_timeout_ms.is_some() || args.request_timeout_ms.is_some() {
        let defaults = TimeoutConfig::default();
        profile.timeout = Some(TimeoutConfig {
            connect_ms: args.connect_timeout_ms.unwrap_or(defaults.connect_ms),
            request_ms: args.request_timeout_ms.unwrap_or(defaults.request_ms),
        });
    }

    Ok(profile)
}

fn execute_set(args: SetArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profile = match build_profile(args) {
        Ok(profile) => profile,
        Err(msg) => {
            formatter.error(&msg);
            return ExitCode::UsageError;
        }
    };
    let name = profile.name.clone();

    match save_profile(manager, profile) {
        Ok(message) => {
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => report(formatter, "Failed to save profile", &e),
    }
}

/// Store the profile, reporting whether an existing one was replaced
fn save_profile(manager: &ProfileManager, profile: Profile) -> yd_core::Result<String> {
    let name = profile.name.clone();
    let replaced = manager.exists(&name)?;
    manager.set(profile)?;
    Ok(if replaced {
        format!("Profile '{name}' updated")
    } else {
        format!("Profile '{name}' configured successfully")
    })
}

fn execute_list(args: ListArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    let profiles = match manager.list() {
        Ok(profiles) => profiles,
        Err(e) => return report(formatter, "Failed to list profiles", &e),
    };

    if formatter.is_json() {
        formatter.json(&ProfileListOutput {
            profiles: profiles.iter().map(ProfileInfo::from).collect(),
        });
    } else if profiles.is_empty() {
        formatter.println("No profiles configured.");
    } else if args.long {
        let rows = profiles
            .iter()
            .map(ProfileInfo::from)
            .map(|info| {
                vec![
                    info.name,
                    info.base_url,
                    format!("v{}", info.api_version),
                    info.token,
                    format!("{}ms / {}ms", info.connect_timeout_ms, info.request_timeout_ms),
                ]
            })
            .collect();
        formatter.table(&["Name", "Endpoint", "API", "Token", "Timeouts"], rows);
    } else {
        for profile in &profiles {
            formatter.println(&format!("{:<12} {}", profile.name, profile.base_url));
        }
    }

    ExitCode::Success
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            let message = format!("Profile '{}' removed successfully", args.name);
            if formatter.is_json() {
                formatter.json(&ProfileOperationOutput {
                    success: true,
                    profile: args.name,
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => report(formatter, "Failed to remove profile", &e),
    }
}
