//! Reporting of unclassified command failures.

use chrono::Utc;
use tracing::error;

/// An unclassified failure, as handed to an [`ErrorSink`].
#[derive(Debug)]
pub struct ErrorEvent<'a> {
    /// The full error, including its cause chain.
    pub error: &'a anyhow::Error,
    /// Milliseconds since the Unix epoch; also shown to the user as a reference.
    pub timestamp_millis: i64,
    /// Command whose dispatch failed, or the pipeline stage that failed
    /// outside of a command.
    pub command: &'a str,
    /// Guild the command was invoked in.
    pub guild: &'a str,
}

impl<'a> ErrorEvent<'a> {
    /// Create an event stamped with the current time.
    pub fn now(error: &'a anyhow::Error, command: &'a str, guild: &'a str) -> Self {
        Self {
            error,
            timestamp_millis: Utc::now().timestamp_millis(),
            command,
            guild,
        }
    }
}

/// Destination for unclassified failures.
pub trait ErrorSink: Send + Sync {
    fn report(&self, event: &ErrorEvent<'_>);
}

/// Sink that emits every event as a `tracing` error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, event: &ErrorEvent<'_>) {
        error!(
            command = event.command,
            guild = event.guild,
            timestamp = event.timestamp_millis,
            "Command failed: {:#}",
            event.error
        );
    }
}
