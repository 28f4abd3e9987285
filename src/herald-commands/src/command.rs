//! Command definitions, the command builder and the dispatch guard.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use crate::args::ParsedArgs;
use crate::argument::Argument;
use crate::capability::Capabilities;
use crate::error::CommandError;

/// Result type returned by command handlers.
pub type HandlerResult = Result<(), CommandError>;

/// The context a command is invoked in.
///
/// Implemented by the front-end's per-message context; the dispatch guard
/// only needs to know which capabilities the bot holds where the command
/// was invoked.
#[async_trait]
pub trait Invocation: Send + Sync + 'static {
    /// Capabilities the bot currently holds in the invoking channel.
    async fn granted_capabilities(&self) -> anyhow::Result<Capabilities>;
}

/// Authorization predicate evaluated before a command runs.
#[async_trait]
pub trait Permission<C>: Send + Sync {
    /// Whether the invoker may run the command.
    async fn allows(&self, ctx: &C) -> bool;
}

/// Execution handler of a command.
#[async_trait]
pub trait Handler<C>: Send + Sync {
    async fn call(&self, ctx: &C, args: &ParsedArgs) -> HandlerResult;
}

/// Adapter turning a synchronous predicate into a [`Permission`].
struct PermissionFn<F>(F);

#[async_trait]
impl<C, F> Permission<C> for PermissionFn<F>
where
    C: Sync,
    F: Fn(&C) -> bool + Send + Sync,
{
    async fn allows(&self, ctx: &C) -> bool {
        (self.0)(ctx)
    }
}

/// Adapter turning a future-returning closure into a [`Handler`].
struct HandlerFn<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<C, F, Fut> Handler<C> for HandlerFn<F, Fut>
where
    C: Sync,
    F: Fn(&C, &ParsedArgs) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: &C, args: &ParsedArgs) -> HandlerResult {
        (self.f)(ctx, args).await
    }
}

/// How a dispatch attempt ended when no error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Every handler ran and succeeded.
    Executed,
    /// The bot lacks these capabilities; no handler ran.
    MissingCapabilities(Capabilities),
}

/// A registered, invokable command.
///
/// Built with a [`CommandBuilder`] and frozen once registered.
pub struct Command<C> {
    name: String,
    aliases: Vec<String>,
    arguments: Vec<Argument>,
    help: Option<String>,
    manual: Vec<String>,
    permissions: Vec<Arc<dyn Permission<C>>>,
    handlers: Vec<Arc<dyn Handler<C>>>,
    capabilities: Capabilities,
}

impl<C> Clone for Command<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            arguments: self.arguments.clone(),
            help: self.help.clone(),
            manual: self.manual.clone(),
            permissions: self.permissions.clone(),
            handlers: self.handlers.clone(),
            capabilities: self.capabilities,
        }
    }
}

impl<C> fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("help", &self.help)
            .field("manual", &self.manual)
            .field("permissions", &self.permissions.len())
            .field("handlers", &self.handlers.len())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl<C: Invocation> Command<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// One-line summary shown in command listings.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn manual(&self) -> &[String] {
        &self.manual
    }

    /// Capabilities the bot needs to run this command.
    pub fn required_capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Check if this command answers to `name` (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.name == name || self.aliases.iter().any(|a| *a == name)
    }

    /// Name followed by aliases.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub(crate) fn push_alias(&mut self, alias: String) {
        self.aliases.push(alias);
    }

    /// Evaluate every permission predicate; all must pass.
    pub async fn is_permitted(&self, ctx: &C) -> bool {
        for permission in &self.permissions {
            if !permission.allows(ctx).await {
                return false;
            }
        }
        true
    }

    /// Validate raw argument text against this command's arguments.
    pub fn parse(&self, raw: &str) -> Result<ParsedArgs, CommandError> {
        ParsedArgs::parse(&self.arguments, raw)
    }

    /// Run the dispatch guard: permissions, arguments, capabilities, handlers.
    pub async fn dispatch(&self, ctx: &C, raw: &str) -> Result<Dispatched, CommandError> {
        if !self.is_permitted(ctx).await {
            return Err(CommandError::Permission(format!(
                "not allowed to use '{}'",
                self.name
            )));
        }

        let args = self.parse(raw)?;

        if !self.capabilities.is_empty() {
            let granted = ctx.granted_capabilities().await?;
            let missing = self.capabilities.missing_from(granted);
            if !missing.is_empty() {
                debug!(
                    command = %self.name,
                    missing = %missing.describe(),
                    "Missing capabilities, not executing"
                );
                return Ok(Dispatched::MissingCapabilities(missing));
            }
        }

        self.execute(ctx, &args).await?;
        Ok(Dispatched::Executed)
    }

    /// Run every handler concurrently and wait for all of them.
    ///
    /// The first failure in declaration order is returned; handlers are
    /// never cancelled and nothing is rolled back.
    pub async fn execute(&self, ctx: &C, args: &ParsedArgs) -> HandlerResult {
        let results = join_all(self.handlers.iter().map(|h| h.call(ctx, args))).await;
        results.into_iter().collect()
    }

    /// Usage line, e.g. `!echo <text> [count=1]`.
    pub fn usage(&self, prefix: &str) -> String {
        std::iter::once(format!("{prefix}{}", self.name))
            .chain(self.arguments.iter().map(Argument::usage))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full manual: usage, aliases and the manual text.
    ///
    /// Falls back to the help summary, then to "No Manual available".
    pub fn render_manual(&self, prefix: &str) -> String {
        let mut out = format!("**{prefix}{}**\nUsage: `{}`", self.name, self.usage(prefix));
        if !self.aliases.is_empty() {
            out.push_str(&format!("\nAliases: {}", self.aliases.join(", ")));
        }
        out.push('\n');
        if !self.manual.is_empty() {
            out.push_str(&self.manual.join("\n"));
        } else if let Some(help) = &self.help {
            out.push_str(help);
        } else {
            out.push_str("No Manual available");
        }
        out
    }
}

/// Fluent configuration of a command.
///
/// Every call consumes the builder and returns the updated value; the
/// command is finalized by [`CommandRegistry::register`](crate::CommandRegistry::register).
pub struct CommandBuilder<C> {
    name: String,
    aliases: Vec<String>,
    arguments: Vec<Argument>,
    help: Option<String>,
    manual: Vec<String>,
    permissions: Vec<Arc<dyn Permission<C>>>,
    handlers: Vec<Arc<dyn Handler<C>>>,
    capabilities: Capabilities,
}

impl<C> fmt::Debug for CommandBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("help", &self.help)
            .field("manual", &self.manual)
            .field("permissions", &self.permissions.len())
            .field("handlers", &self.handlers.len())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl<C: Invocation> CommandBuilder<C> {
    /// Start a command named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            aliases: Vec::new(),
            arguments: Vec::new(),
            help: None,
            manual: Vec::new(),
            permissions: Vec::new(),
            handlers: Vec::new(),
            capabilities: Capabilities::empty(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Add an alternative name. Colliding aliases are dropped at registration.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Append a line to the manual.
    pub fn manual(mut self, line: impl Into<String>) -> Self {
        self.manual.push(line.into());
        self
    }

    pub fn clear_manual(mut self) -> Self {
        self.manual.clear();
        self
    }

    /// Add a permission predicate. All predicates must pass.
    pub fn check_permission(mut self, permission: impl Permission<C> + 'static) -> Self {
        self.permissions.push(Arc::new(permission));
        self
    }

    /// Add a synchronous permission predicate.
    pub fn check_permission_fn<F>(self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.check_permission(PermissionFn(predicate))
    }

    /// Append an argument; declaration order is consumption order.
    pub fn argument(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Require capabilities from the bot in the invoking channel.
    pub fn require_capability(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Add an execution handler.
    pub fn exec(mut self, handler: impl Handler<C> + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Add an execution handler from a closure returning a future.
    pub fn exec_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(&C, &ParsedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.exec(HandlerFn {
            f,
            _future: PhantomData,
        })
    }

    /// Candidate aliases, lowercased, in declaration order.
    pub(crate) fn take_aliases(&mut self) -> Vec<String> {
        std::mem::take(&mut self.aliases)
            .into_iter()
            .map(|a| a.to_lowercase())
            .collect()
    }

    pub(crate) fn build(self) -> Command<C> {
        Command {
            name: self.name,
            aliases: self.aliases,
            arguments: self.arguments,
            help: self.help,
            manual: self.manual,
            permissions: self.permissions,
            handlers: self.handlers,
            capabilities: self.capabilities,
        }
    }
}
