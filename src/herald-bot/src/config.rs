//! Configuration for the bot runtime.
//!
//! Supports loading configuration from:
//! - A TOML file
//! - Environment variables (`HERALD_PREFIX`, `HERALD_COMMAND_TIMEOUT_SECS`,
//!   `HERALD_HELP_PAGE_SIZE`), which override the file

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BotError, BotResult};

/// Prefix used when a guild has none stored.
pub const DEFAULT_PREFIX: &str = "!";

/// Entries per reply of the built-in help listing.
pub const DEFAULT_HELP_PAGE_SIZE: usize = 25;

const ENV_PREFIX: &str = "HERALD_PREFIX";
const ENV_COMMAND_TIMEOUT: &str = "HERALD_COMMAND_TIMEOUT_SECS";
const ENV_HELP_PAGE_SIZE: &str = "HERALD_HELP_PAGE_SIZE";

/// Configuration for message dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix for guilds without a stored one.
    pub default_prefix: String,
    /// Upper bound on a single command's dispatch; unbounded when unset.
    pub command_timeout_secs: Option<u64>,
    /// Entries per help page.
    pub help_page_size: usize,
    /// Ignore messages written by other bots.
    pub ignore_bots: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX.to_string(),
            command_timeout_secs: None,
            help_page_size: DEFAULT_HELP_PAGE_SIZE,
            ignore_bots: true,
        }
    }
}

impl BotConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> BotResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BotError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded bot config");
        Self::from_toml(&text)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> BotResult<Self> {
        Self::default().with_env()
    }

    /// Apply environment variable overrides.
    pub fn with_env(self) -> BotResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> BotResult<Self> {
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.default_prefix = prefix;
        }
        if let Some(secs) = lookup(ENV_COMMAND_TIMEOUT) {
            let secs = secs.trim().parse().map_err(|_| {
                BotError::Config(format!("{ENV_COMMAND_TIMEOUT} must be a number of seconds"))
            })?;
            self.command_timeout_secs = Some(secs);
        }
        if let Some(size) = lookup(ENV_HELP_PAGE_SIZE) {
            self.help_page_size = size.trim().parse().map_err(|_| {
                BotError::Config(format!("{ENV_HELP_PAGE_SIZE} must be a positive integer"))
            })?;
        }
        Ok(self)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = prefix.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Per-command timeout, if any.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BotResult<()> {
        if self.default_prefix.trim().is_empty() {
            return Err(BotError::Config("Default prefix is empty".to_string()));
        }
        if self.default_prefix.chars().any(char::is_whitespace) {
            return Err(BotError::Config(
                "Default prefix must not contain whitespace".to_string(),
            ));
        }
        if self.help_page_size == 0 {
            return Err(BotError::Config(
                "Help page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
