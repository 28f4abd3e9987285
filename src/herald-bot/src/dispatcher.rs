//! The message dispatch pipeline.
//!
//! An inbound message goes through:
//! 1. Filtering (own messages, direct messages, authorless and bot messages)
//! 2. Prefix resolution, or a prefix reminder when only the bot is mentioned
//! 3. Splitting into command name and argument text
//! 4. Registry lookup
//! 5. The dispatch guard of every matching command, run concurrently
//! 6. Translation of failures into replies and error reports

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, LazyLock};

use futures::FutureExt;
use futures::future::join_all;
use herald_commands::{Capabilities, Command, CommandError, CommandRegistry, Dispatched};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::context::{MessageContext, Services};
use crate::error::{BotError, BotResult};
use crate::message::InboundMessage;
use crate::prefix::{PrefixResolver, PrefixStore};
use crate::replies;
use crate::telemetry::{ErrorEvent, ErrorSink, TracingErrorSink};
use crate::transport::Transport;

/// Command name, then everything after it with surrounding whitespace trimmed.
static COMMAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(\S+)\s*(.*?)\s*$").expect("valid command regex"));

/// Why a message was not considered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Written by the bot itself.
    OwnMessage,
    /// Sent outside of a guild.
    DirectMessage,
    /// No author attached.
    NoAuthor,
    /// Written by another bot while `ignore_bots` is set.
    BotAuthor,
}

/// How one matched command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Every handler succeeded.
    Executed,
    /// The bot lacks capabilities in the channel; nothing ran.
    MissingCapabilities(Capabilities),
    /// A required argument was rejected.
    InvalidArgument,
    /// Input was left over after the last argument.
    TooManyArguments,
    /// A permission predicate rejected the author.
    PermissionDenied,
    /// An unclassified failure, reported under this reference.
    Failed { timestamp_millis: i64 },
}

/// Outcome of one matched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    pub outcome: CommandOutcome,
}

/// What the pipeline did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    Ignored(IgnoreReason),
    /// Only the bot was mentioned; the prefix reminder was sent.
    PrefixHelp,
    /// The message does not start with the guild's prefix.
    NotACommand,
    /// No registered command answers to this name.
    UnknownCommand(String),
    /// Every matched command settled.
    Dispatched(Vec<CommandReport>),
}

impl DispatchReport {
    /// Reports of the matched commands; empty unless dispatched.
    pub fn outcomes(&self) -> &[CommandReport] {
        match self {
            Self::Dispatched(reports) => reports,
            _ => &[],
        }
    }
}

/// Routes inbound messages to registered commands.
pub struct Dispatcher {
    services: Services,
    sink: Arc<dyn ErrorSink>,
}

impl Dispatcher {
    /// Create a dispatcher without prefix persistence.
    ///
    /// The registry is frozen from here on.
    pub fn new(
        registry: CommandRegistry<MessageContext>,
        transport: Arc<dyn Transport>,
        config: BotConfig,
    ) -> Self {
        let prefixes = PrefixResolver::new(config.default_prefix.clone());
        Self {
            services: Services {
                transport,
                registry: Arc::new(registry),
                prefixes: Arc::new(prefixes),
                config: Arc::new(config),
            },
            sink: Arc::new(TracingErrorSink),
        }
    }

    /// Persist guild prefixes through `store`.
    pub fn with_prefix_store(mut self, store: Arc<dyn PrefixStore>) -> Self {
        let default_prefix = self.services.config.default_prefix.clone();
        self.services.prefixes = Arc::new(PrefixResolver::with_store(default_prefix, store));
        self
    }

    /// Send unclassified failures to `sink` instead of `tracing`.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry(&self) -> &CommandRegistry<MessageContext> {
        &self.services.registry
    }

    pub fn prefixes(&self) -> &PrefixResolver {
        &self.services.prefixes
    }

    pub fn config(&self) -> &BotConfig {
        &self.services.config
    }

    /// Run the pipeline for one message.
    ///
    /// Command failures are answered in the channel and never returned;
    /// an error here means the guild's prefix could not be resolved or
    /// the prefix reminder could not be sent. Both are also handed to the
    /// error sink.
    pub async fn dispatch_message(&self, message: InboundMessage) -> BotResult<DispatchReport> {
        let bot_id = self.services.transport.bot_user_id();

        let Some(author) = message.author.clone() else {
            return Ok(DispatchReport::Ignored(IgnoreReason::NoAuthor));
        };
        if author == bot_id {
            return Ok(DispatchReport::Ignored(IgnoreReason::OwnMessage));
        }
        let Some(guild) = message.guild.clone() else {
            return Ok(DispatchReport::Ignored(IgnoreReason::DirectMessage));
        };
        if message.author_is_bot && self.services.config.ignore_bots {
            return Ok(DispatchReport::Ignored(IgnoreReason::BotAuthor));
        }

        let prefix = match self.services.prefixes.get_prefix(&guild).await {
            Ok(prefix) => prefix,
            Err(e) => return Err(self.report_failure(e, "prefix lookup", &guild)),
        };

        if message.mentions.is_only(bot_id) {
            debug!(guild = %guild, channel = %message.channel, "Sending prefix help");
            let sent = self
                .services
                .transport
                .send_message(&message.channel, &replies::prefix_help(&prefix))
                .await;
            return match sent {
                Ok(()) => Ok(DispatchReport::PrefixHelp),
                Err(e) => Err(self.report_failure(e, "prefix help", &guild)),
            };
        }

        let Some(body) = message.content.strip_prefix(prefix.as_str()) else {
            return Ok(DispatchReport::NotACommand);
        };
        let Some(captures) = COMMAND_PATTERN.captures(body) else {
            return Ok(DispatchReport::NotACommand);
        };
        let name = captures.get(1).map_or("", |m| m.as_str()).to_string();
        let args = captures.get(2).map_or("", |m| m.as_str()).to_string();

        let commands = self.services.registry.resolve(&name);
        if commands.is_empty() {
            debug!(guild = %guild, command = %name, "Unknown command");
            return Ok(DispatchReport::UnknownCommand(name));
        }

        info!(
            guild = %guild,
            author = %author,
            command = %name,
            matches = commands.len(),
            "Dispatching command"
        );

        let ctx = MessageContext::new(message, guild, author, prefix, &self.services);
        let reports = join_all(
            commands
                .iter()
                .map(|command| self.run_command(&ctx, command, &args)),
        )
        .await;

        Ok(DispatchReport::Dispatched(reports))
    }

    async fn run_command(
        &self,
        ctx: &MessageContext,
        command: &Arc<Command<MessageContext>>,
        args: &str,
    ) -> CommandReport {
        let dispatch = AssertUnwindSafe(command.dispatch(ctx, args))
            .catch_unwind()
            .map(|caught| {
                caught.unwrap_or_else(|payload| {
                    Err(CommandError::unclassified(anyhow::anyhow!(
                        "command '{}' panicked: {}",
                        command.name(),
                        panic_message(payload.as_ref())
                    )))
                })
            });
        let result = match self.services.config.command_timeout() {
            Some(limit) => match tokio::time::timeout(limit, dispatch).await {
                Ok(result) => result,
                Err(_) => Err(CommandError::unclassified(BotError::Timeout(format!(
                    "command '{}' did not finish within {}s",
                    command.name(),
                    limit.as_secs()
                )))),
            },
            None => dispatch.await,
        };

        CommandReport {
            command: command.name().to_string(),
            outcome: self.settle(ctx, command, result).await,
        }
    }

    async fn settle(
        &self,
        ctx: &MessageContext,
        command: &Command<MessageContext>,
        result: Result<Dispatched, CommandError>,
    ) -> CommandOutcome {
        let error = match result {
            Ok(Dispatched::Executed) => {
                debug!(command = %command.name(), "Command executed");
                return CommandOutcome::Executed;
            }
            Ok(Dispatched::MissingCapabilities(missing)) => {
                self.report_missing_capabilities(ctx, command, missing).await;
                return CommandOutcome::MissingCapabilities(missing);
            }
            Err(error) => error,
        };

        let outcome = match &error {
            CommandError::Unclassified(cause) => {
                let event = ErrorEvent::now(cause, command.name(), ctx.guild());
                self.sink.report(&event);
                self.deliver(ctx, replies::unclassified(command.name(), event.timestamp_millis))
                    .await;
                return CommandOutcome::Failed {
                    timestamp_millis: event.timestamp_millis,
                };
            }
            CommandError::Parse(_) => CommandOutcome::InvalidArgument,
            CommandError::TooManyArguments { .. } => CommandOutcome::TooManyArguments,
            CommandError::Permission(_) => CommandOutcome::PermissionDenied,
        };

        debug!(command = %command.name(), error = %error, "Command rejected");
        if let Some(reply) = replies::command_error(command, &error, ctx.prefix()) {
            self.deliver(ctx, reply).await;
        }
        outcome
    }

    /// Hand a failure outside of any command to the sink and give it back.
    fn report_failure(&self, error: BotError, stage: &str, guild: &str) -> BotError {
        let cause = anyhow::anyhow!("{error}");
        self.sink.report(&ErrorEvent::now(&cause, stage, guild));
        error
    }

    async fn report_missing_capabilities(
        &self,
        ctx: &MessageContext,
        command: &Command<MessageContext>,
        missing: Capabilities,
    ) {
        let text = replies::missing_capabilities(command.name(), ctx.channel(), missing);
        if missing.contains(Capabilities::SEND_MESSAGES) {
            debug!(command = %command.name(), "Cannot send in channel, notifying author privately");
            if let Err(e) = ctx.reply_direct(&text).await {
                warn!(author = %ctx.author(), error = %e, "Failed to notify author privately");
            }
        } else {
            self.deliver(ctx, text).await;
        }
    }

    async fn deliver(&self, ctx: &MessageContext, text: String) {
        if let Err(e) = ctx.reply(&text).await {
            warn!(channel = %ctx.channel(), error = %e, "Failed to send reply");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
