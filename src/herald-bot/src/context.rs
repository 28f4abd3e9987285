//! Per-message invocation context handed to command handlers.

use std::sync::Arc;

use async_trait::async_trait;
use herald_commands::{Capabilities, CommandRegistry, Invocation};

use crate::config::BotConfig;
use crate::error::BotResult;
use crate::message::InboundMessage;
use crate::prefix::PrefixResolver;
use crate::transport::Transport;

/// Context of one dispatched message.
///
/// Cheap to clone; handlers that need an owned future clone it into their
/// `async move` block.
#[derive(Clone)]
pub struct MessageContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    message: InboundMessage,
    guild: String,
    author: String,
    prefix: String,
    transport: Arc<dyn Transport>,
    registry: Arc<CommandRegistry<MessageContext>>,
    prefixes: Arc<PrefixResolver>,
    config: Arc<BotConfig>,
}

impl std::fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContext")
            .field("guild", &self.inner.guild)
            .field("channel", &self.inner.message.channel)
            .field("author", &self.inner.author)
            .field("prefix", &self.inner.prefix)
            .finish()
    }
}

/// Shared handles a [`MessageContext`] is built from.
pub(crate) struct Services {
    pub transport: Arc<dyn Transport>,
    pub registry: Arc<CommandRegistry<MessageContext>>,
    pub prefixes: Arc<PrefixResolver>,
    pub config: Arc<BotConfig>,
}

impl MessageContext {
    pub(crate) fn new(
        message: InboundMessage,
        guild: String,
        author: String,
        prefix: String,
        services: &Services,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                message,
                guild,
                author,
                prefix,
                transport: services.transport.clone(),
                registry: services.registry.clone(),
                prefixes: services.prefixes.clone(),
                config: services.config.clone(),
            }),
        }
    }

    pub fn message(&self) -> &InboundMessage {
        &self.inner.message
    }

    pub fn guild(&self) -> &str {
        &self.inner.guild
    }

    pub fn channel(&self) -> &str {
        &self.inner.message.channel
    }

    pub fn author(&self) -> &str {
        &self.inner.author
    }

    /// Prefix the message was invoked with.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn registry(&self) -> &CommandRegistry<MessageContext> {
        &self.inner.registry
    }

    pub fn prefixes(&self) -> &PrefixResolver {
        &self.inner.prefixes
    }

    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Post `text` to the invoking channel.
    pub async fn reply(&self, text: impl AsRef<str>) -> BotResult<()> {
        self.inner
            .transport
            .send_message(self.channel(), text.as_ref())
            .await
    }

    /// Send `text` privately to the author.
    pub async fn reply_direct(&self, text: impl AsRef<str>) -> BotResult<()> {
        self.inner
            .transport
            .send_direct_message(self.author(), text.as_ref())
            .await
    }

    /// Change the prefix of the invoking guild.
    pub async fn set_guild_prefix(&self, prefix: impl Into<String>) -> BotResult<()> {
        self.inner.prefixes.set_prefix(self.guild(), prefix).await
    }
}

#[async_trait]
impl Invocation for MessageContext {
    async fn granted_capabilities(&self) -> anyhow::Result<Capabilities> {
        Ok(self
            .inner
            .transport
            .granted_capabilities(self.guild(), self.channel())
            .await?)
    }
}
