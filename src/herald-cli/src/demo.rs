//! Commands available in the console.

use std::collections::HashSet;
use std::sync::Arc;

use herald_bot::{MessageContext, register_help};
use herald_commands::{Argument, CommandError, CommandRegistry, ParsedArgs, RegistryError};

/// Build the console registry: `help`, `ping`, `echo`, `repeat`, `sum` and `prefix`.
///
/// `prefix` is limited to `admins`.
pub fn registry(admins: Vec<String>) -> Result<CommandRegistry<MessageContext>, RegistryError> {
    let mut registry = CommandRegistry::new();
    register_help(&mut registry)?;

    let ping = registry
        .command("ping")?
        .help("Check that the bot answers")
        .exec_fn(|ctx: &MessageContext, _: &ParsedArgs| {
            let ctx = ctx.clone();
            async move { ctx.reply("Pong!").await.map_err(CommandError::unclassified) }
        });
    registry.register(ping)?;

    let echo = registry
        .command("echo")?
        .alias("say")
        .help("Repeat a message")
        .argument(Argument::rest("message").max_length(2000))
        .exec_fn(|ctx: &MessageContext, args: &ParsedArgs| {
            let ctx = ctx.clone();
            let message = args.text("message").unwrap_or_default().to_string();
            async move { ctx.reply(message).await.map_err(CommandError::unclassified) }
        });
    registry.register(echo)?;

    let repeat = registry
        .command("repeat")?
        .help("Repeat a message a few times")
        .manual("Posts the message up to five times.")
        .manual("The count is optional and defaults to two.")
        .argument(
            Argument::number("times")
                .integer()
                .min(1.0)
                .max(5.0)
                .default_value(2.0),
        )
        .argument(Argument::rest("message"))
        .exec_fn(|ctx: &MessageContext, args: &ParsedArgs| {
            let ctx = ctx.clone();
            let times = args.integer("times").unwrap_or(1).max(1) as usize;
            let message = args.text("message").unwrap_or_default().to_string();
            async move {
                ctx.reply(vec![message; times].join("\n"))
                    .await
                    .map_err(CommandError::unclassified)
            }
        });
    registry.register(repeat)?;

    let sum = registry
        .command("sum")?
        .alias("add")
        .help("Add two numbers")
        .argument(Argument::number("a"))
        .argument(Argument::number("b"))
        .exec_fn(|ctx: &MessageContext, args: &ParsedArgs| {
            let ctx = ctx.clone();
            let total = args.number("a").unwrap_or_default()
                + args.number("b").unwrap_or_default();
            async move {
                ctx.reply(format!("{total}"))
                    .await
                    .map_err(CommandError::unclassified)
            }
        });
    registry.register(sum)?;

    let admins: Arc<HashSet<String>> = Arc::new(admins.into_iter().collect());
    let prefix = registry
        .command("prefix")?
        .help("Change the command prefix of this guild")
        .argument(
            Argument::string("value")
                .display("new prefix")
                .max_length(5),
        )
        .check_permission_fn(move |ctx: &MessageContext| admins.contains(ctx.author()))
        .exec_fn(|ctx: &MessageContext, args: &ParsedArgs| {
            let ctx = ctx.clone();
            let value = args.text("value").unwrap_or_default().to_string();
            async move {
                ctx.set_guild_prefix(value.clone())
                    .await
                    .map_err(CommandError::unclassified)?;
                ctx.reply(format!("Prefix changed to `{value}`."))
                    .await
                    .map_err(CommandError::unclassified)
            }
        });
    registry.register(prefix)?;

    Ok(registry)
}
