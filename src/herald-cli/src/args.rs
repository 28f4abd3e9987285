//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use herald_bot::{BotConfig, BotResult};

/// Log level for console output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Herald console: every stdin line is dispatched as a chat message.
#[derive(Debug, Parser)]
#[command(name = "herald")]
#[command(author, version)]
#[command(about = "Herald - chat command dispatcher console", long_about = None)]
pub struct Cli {
    /// Bot config file (TOML)
    #[arg(long, short = 'c', value_name = "FILE", env = "HERALD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Default prefix, overriding config and environment
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,

    /// Guild the console messages are posted in
    #[arg(long, default_value = "console")]
    pub guild: String,

    /// Author of the console messages
    #[arg(long, short = 'u', default_value = "user")]
    pub user: String,

    /// Users allowed to run moderator commands; defaults to `--user`
    #[arg(long = "admin", value_name = "USER")]
    pub admins: Vec<String>,

    /// JSON file persisting per-guild prefixes
    #[arg(long, value_name = "FILE")]
    pub prefix_store: Option<PathBuf>,

    /// Log level (`RUST_LOG` takes precedence)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

impl Cli {
    /// Resolve the bot config: file, then environment, then flags.
    pub fn bot_config(&self) -> BotResult<BotConfig> {
        let config = match &self.config {
            Some(path) => BotConfig::from_file(path)?,
            None => BotConfig::default(),
        };
        let mut config = config.with_env()?;
        if let Some(prefix) = &self.prefix {
            config = config.with_prefix(prefix.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Users allowed to run moderator commands.
    pub fn admins(&self) -> Vec<String> {
        if self.admins.is_empty() {
            vec![self.user.clone()]
        } else {
            self.admins.clone()
        }
    }
}
