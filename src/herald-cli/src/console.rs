//! A [`Transport`] that prints to the terminal.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use herald_bot::{BotError, BotResult, InboundMessage, Mentions, Transport};
use herald_commands::Capabilities;

/// User ID of the console bot.
pub const BOT_USER_ID: &str = "herald";

/// Channel every console message is posted in.
pub const CONSOLE_CHANNEL: &str = "console";

/// Writes channel messages and direct messages as plain lines.
pub struct ConsoleTransport {
    out: Mutex<Box<dyn Write + Send>>,
    granted: Capabilities,
}

impl std::fmt::Debug for ConsoleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleTransport")
            .field("granted", &self.granted)
            .finish()
    }
}

impl ConsoleTransport {
    /// Transport printing to stdout and granting every capability.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            granted: Capabilities::all(),
        }
    }

    /// Restrict the capabilities reported for every channel.
    pub fn granting(mut self, granted: Capabilities) -> Self {
        self.granted = granted;
        self
    }

    fn write_line(&self, line: &str) -> BotResult<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| BotError::Transport("console output poisoned".to_string()))?;
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| BotError::Transport(e.to_string()))
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn bot_user_id(&self) -> &str {
        BOT_USER_ID
    }

    async fn send_message(&self, channel: &str, text: &str) -> BotResult<()> {
        self.write_line(&format!("[#{channel}] {text}"))
    }

    async fn send_direct_message(&self, user: &str, text: &str) -> BotResult<()> {
        self.write_line(&format!("[@{user}] {text}"))
    }

    async fn granted_capabilities(&self, _guild: &str, _channel: &str) -> BotResult<Capabilities> {
        Ok(self.granted)
    }
}

/// Collect `<@user>`, `<@&role>`, `<#channel>` and `@everyone`/`@here` mentions.
pub fn parse_mentions(content: &str) -> Mentions {
    let mut mentions = Mentions::default();
    for token in content.split_whitespace() {
        if token == "@everyone" || token == "@here" {
            mentions.everyone = true;
            continue;
        }
        let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
            continue;
        };
        if let Some(role) = inner.strip_prefix("@&") {
            mentions.roles.push(role.to_string());
        } else if let Some(user) = inner.strip_prefix('@') {
            mentions.users.push(user.trim_start_matches('!').to_string());
        } else if let Some(channel) = inner.strip_prefix('#') {
            mentions.channels.push(channel.to_string());
        }
    }
    mentions
}

/// Build the message for one console line.
pub fn console_message(guild: &str, user: &str, line: &str) -> InboundMessage {
    InboundMessage::new(guild, CONSOLE_CHANNEL, user, line).with_mentions(parse_mentions(line))
}
