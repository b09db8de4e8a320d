//! Profile management
//!
//! Profiles are named connection settings for the disk API: token,
//! endpoint, timeouts and the polling schedule used while waiting on
//! asynchronous operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ClientConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// Polling schedule for operation status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of status queries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second query in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the delay between queries in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    20
}

fn default_initial_backoff() -> u64 {
    250
}

fn default_max_backoff() -> u64 {
    10000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

/// Timeout configuration for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Whole-request deadline in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    300_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            request_ms: default_request_timeout(),
        }
    }
}

/// A named set of connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    /// OAuth token
    pub token: String,

    /// API endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,

    /// Polling schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

impl Profile {
    /// Create a new profile with required fields
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout: None,
            poll: None,
        }
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }

    /// Get the effective polling schedule
    pub fn poll_config(&self) -> PollConfig {
        self.poll.clone().unwrap_or_default()
    }

    /// Client settings derived from this profile
    pub fn client_config(&self) -> ClientConfig {
        let timeout = self.timeout_config();
        ClientConfig::new(self.token.clone())
            .base_url(self.base_url.clone())
            .api_version(self.api_version)
            .timeout(Duration::from_millis(timeout.request_ms))
    }

    /// Token with all but the last four characters masked
    ///
    /// Tokens of four characters or fewer are masked entirely.
    pub fn masked_token(&self) -> String {
        if self.token.chars().count() <= 4 {
            return "****".to_string();
        }
        let visible: String = self
            .token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{visible}")
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("token", &self.masked_token())
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

/// Manager for profile operations
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    /// Create a new ProfileManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new ProfileManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// List all configured profiles
    pub fn list(&self) -> Result<Vec<Profile>> {
        let config = self.config_manager.load()?;
        Ok(config.profiles)
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Result<Profile> {
        let config = self.config_manager.load()?;
        config
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add or update a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        if profile.token.trim().is_empty() {
            return Err(Error::Validation("OAuth token cannot be empty".into()));
        }

        let mut config = self.config_manager.load()?;

        // Replace existing profile with same name
        config.profiles.retain(|p| p.name != profile.name);
        config.profiles.push(profile);

        self.config_manager.save(&config)
    }

    /// Remove a profile
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.profiles.len();

        config.profiles.retain(|p| p.name != name);

        if config.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    /// Whether a profile with this name is stored
    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.profiles.iter().any(|p| p.name == name))
    }
}
