//! Profile store on disk
//!
//! Profiles live in `config.toml` under `$YD_CONFIG_DIR`, or `<config dir>/yd`
//! when the variable is unset. The file holds OAuth tokens and is written
//! owner-only.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "YD_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "current_schema")]
    pub schema_version: u32,

    #[serde(default)]
    pub profiles: Vec<Profile>,
}

fn current_schema() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            profiles: Vec::new(),
        }
    }
}

impl Config {
    /// Check hand-edited profiles and bring their endpoints into canonical form
    fn normalize(&mut self) -> Result<()> {
        let mut seen = HashSet::new();
        for profile in &mut self.profiles {
            if !seen.insert(profile.name.clone()) {
                return Err(Error::Config(format!(
                    "profile '{}' is defined more than once",
                    profile.name
                )));
            }
            if !profile.base_url.starts_with("http://") && !profile.base_url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "profile '{}' has base_url '{}' without an http(s) scheme",
                    profile.name, profile.base_url
                )));
            }
            if profile.api_version == 0 {
                return Err(Error::Config(format!(
                    "profile '{}' has api_version 0",
                    profile.name
                )));
            }
            let trimmed = profile.base_url.trim_end_matches('/').len();
            profile.base_url.truncate(trimmed);
        }
        Ok(())
    }
}

/// Directory holding `config.toml`
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(std::env::var_os(CONFIG_DIR_ENV))
}

fn resolve_config_dir(override_dir: Option<OsString>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .map(|dir| dir.join("yd"))
            .ok_or_else(|| Error::Config("Could not determine config directory".into())),
    }
}

/// Reads and writes the profile store
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(config_dir()?.join(CONFIG_FILE)))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the store; a missing file is an empty store
    ///
    /// Files written by a newer yd are refused rather than rewritten with
    /// fields dropped.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "{} uses schema {} but this yd understands up to {SCHEMA_VERSION}; upgrade yd",
                self.config_path.display(),
                config.schema_version
            )));
        }
        config.schema_version = SCHEMA_VERSION;
        config.normalize()?;

        Ok(config)
    }

    /// Write the store, creating parent directories, with mode 0600 on unix
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.config_path, toml::to_string_pretty(config)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.config_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.config_path.display(), profiles = config.profiles.len(), "saved profiles");
        Ok(())
    }
}
