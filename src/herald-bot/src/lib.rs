//! Chat-side runtime for Herald commands.
//!
//! This crate connects a [`CommandRegistry`](herald_commands::CommandRegistry)
//! to a chat platform:
//! - [`Dispatcher`] runs the pipeline from inbound message to reply
//! - [`PrefixResolver`] caches per-guild prefixes in front of a [`PrefixStore`]
//! - [`MessageContext`] is what command handlers receive
//! - [`register_help`] adds the built-in `help` command
//!
//! The platform itself stays behind the [`Transport`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_bot::{BotConfig, Dispatcher, register_help};
//! use herald_commands::CommandRegistry;
//!
//! let mut registry = CommandRegistry::new();
//! register_help(&mut registry)?;
//!
//! let dispatcher = Dispatcher::new(registry, transport, BotConfig::from_env()?);
//! let report = dispatcher.dispatch_message(message).await?;
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod help;
pub mod message;
pub mod prefix;
pub mod replies;
pub mod telemetry;
pub mod transport;

// Re-export main types
pub use config::BotConfig;
pub use context::MessageContext;
pub use dispatcher::{CommandOutcome, CommandReport, DispatchReport, Dispatcher, IgnoreReason};
pub use error::{BotError, BotResult};
pub use help::register_help;
pub use message::{InboundMessage, Mentions};
pub use prefix::{PrefixResolver, PrefixStore};
pub use telemetry::{ErrorEvent, ErrorSink, TracingErrorSink};
pub use transport::Transport;
