//! Herald console.
//!
//! Drives the dispatcher from a terminal: every line read from stdin is
//! posted as a message of one guild, and replies are printed to stdout.
//! Logs go to stderr.
//!
//! ```text
//! $ herald --prefix '?'
//! ?ping
//! [#console] Pong!
//! <@herald>
//! [#console] My prefix here is `?`. Use `?help` to see what I can do.
//! ```

pub mod args;
pub mod console;
pub mod demo;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use herald_bot::{DispatchReport, Dispatcher};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

pub use args::{Cli, LogLevel};
pub use console::{BOT_USER_ID, ConsoleTransport, console_message, parse_mentions};
pub use store::JsonPrefixStore;

/// Build the dispatcher described by `cli`.
pub fn build_dispatcher(cli: &Cli, transport: ConsoleTransport) -> Result<Dispatcher> {
    let config = cli.bot_config().context("Invalid bot configuration")?;
    let registry = demo::registry(cli.admins()).context("Failed to register commands")?;

    let mut dispatcher = Dispatcher::new(registry, Arc::new(transport), config);
    if let Some(path) = &cli.prefix_store {
        info!(path = %path.display(), "Using prefix store");
        dispatcher = dispatcher.with_prefix_store(Arc::new(JsonPrefixStore::new(path)));
    }
    Ok(dispatcher)
}

/// Dispatch every line of `reader` until it is exhausted.
///
/// Returns the number of lines that ran at least one command.
pub async fn serve_lines<R>(
    dispatcher: &Dispatcher,
    reader: R,
    guild: &str,
    user: &str,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut dispatched = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }
        match dispatcher
            .dispatch_message(console_message(guild, user, &line))
            .await
        {
            Ok(DispatchReport::Dispatched(reports)) => {
                debug!(?reports, "Line dispatched");
                dispatched += 1;
            }
            Ok(report) => debug!(?report, "Line not dispatched"),
            Err(e) => warn!(error = %e, "Dispatch failed"),
        }
    }

    Ok(dispatched)
}

/// Run the console on stdin.
pub async fn run(cli: Cli) -> Result<()> {
    let dispatcher = build_dispatcher(&cli, ConsoleTransport::stdout())?;
    info!(
        guild = %cli.guild,
        user = %cli.user,
        prefix = %dispatcher.config().default_prefix,
        "Herald console ready"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(&dispatcher, stdin, &cli.guild, &cli.user).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn session(args: &[&str], input: &str) -> (usize, String) {
        let cli = Cli::parse_from(std::iter::once("herald").chain(args.iter().copied()));
        let buffer = SharedBuffer::default();
        let transport = ConsoleTransport::with_writer(Box::new(buffer.clone()));
        let dispatcher = build_dispatcher(&cli, transport).unwrap();

        let dispatched = serve_lines(&dispatcher, input.as_bytes(), &cli.guild, &cli.user)
            .await
            .unwrap();
        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (dispatched, output)
    }

    #[tokio::test]
    async fn test_console_session() {
        let (dispatched, output) = session(
            &["--prefix", "!"],
            "!ping\nhello\n\n!say hi there\n!repeat 3 ho\n!sum 1.5 2\n",
        )
        .await;

        assert_eq!(dispatched, 4);
        assert_eq!(
            output,
            "[#console] Pong!\n\
             [#console] hi there\n\
             [#console] ho\nho\nho\n\
             [#console] 3.5\n"
        );
    }

    #[tokio::test]
    async fn test_repeat_falls_back_to_default_count() {
        let (_, output) = session(&["--prefix", "!"], "!repeat hey\n").await;
        assert_eq!(output, "[#console] hey\nhey\n");
    }

    #[tokio::test]
    async fn test_prefix_requires_admin() {
        let (_, output) = session(
            &["--prefix", "!", "--user", "guest", "--admin", "owner"],
            "!prefix ?\n",
        )
        .await;
        assert_eq!(
            output,
            "[#console] Permission denied: not allowed to use 'prefix'.\n"
        );
    }

    #[tokio::test]
    async fn test_prefix_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("prefixes.json");
        let store_arg = store.to_string_lossy().to_string();

        let (_, output) = session(
            &["--prefix", "!", "--prefix-store", &store_arg],
            "!prefix ?\n!ping\n?ping\n",
        )
        .await;
        assert_eq!(
            output,
            "[#console] Prefix changed to `?`.\n[#console] Pong!\n"
        );

        // a new session on the same store keeps the guild prefix
        let (dispatched, output) = session(
            &["--prefix", "!", "--prefix-store", &store_arg],
            "?ping\n",
        )
        .await;
        assert_eq!(dispatched, 1);
        assert_eq!(output, "[#console] Pong!\n");
    }

    #[tokio::test]
    async fn test_mention_prints_prefix_help() {
        let (dispatched, output) = session(&["--prefix", "?"], "<@herald>\n").await;

        assert_eq!(dispatched, 0);
        assert_eq!(
            output,
            "[#console] My prefix here is `?`. Use `?help` to see what I can do.\n"
        );
    }
}
