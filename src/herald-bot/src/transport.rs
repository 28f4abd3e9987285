//! The chat transport the dispatcher talks through.

use async_trait::async_trait;
use herald_commands::Capabilities;

use crate::error::BotResult;

/// Outbound side of a chat client.
///
/// Implementations wrap a concrete platform client. Every method may
/// suspend; none is retried by the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// User ID of the bot account itself.
    fn bot_user_id(&self) -> &str;

    /// Post `text` to a channel.
    async fn send_message(&self, channel: &str, text: &str) -> BotResult<()>;

    /// Send `text` privately to a user.
    async fn send_direct_message(&self, user: &str, text: &str) -> BotResult<()>;

    /// Capabilities the bot holds in `channel` of `guild`.
    async fn granted_capabilities(&self, guild: &str, channel: &str) -> BotResult<Capabilities>;
}
