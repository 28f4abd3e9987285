//! The built-in `help` command.

use async_trait::async_trait;
use herald_commands::{
    Argument, CommandError, CommandRegistry, Handler, HandlerResult, ParsedArgs, RegistryError,
};

use crate::context::MessageContext;

/// Register `help` on `registry`.
///
/// Without an argument it lists every command the author may use that has
/// a help text, one reply per page. With a command name it shows the
/// manual of every matching command the author may use.
pub fn register_help(registry: &mut CommandRegistry<MessageContext>) -> Result<(), RegistryError> {
    let help = registry
        .command("help")?
        .help("List commands or show the manual of one")
        .manual("Without arguments, lists every command you can use.")
        .manual("With a command name, shows that command's manual.")
        .argument(Argument::string("command").optional())
        .exec(HelpHandler);
    registry.register(help)
}

struct HelpHandler;

#[async_trait]
impl Handler<MessageContext> for HelpHandler {
    async fn call(&self, ctx: &MessageContext, args: &ParsedArgs) -> HandlerResult {
        let pages = match args.text("command") {
            Some(name) => vec![manual_of(ctx, name).await],
            None => listing(ctx).await,
        };
        for page in pages {
            ctx.reply(page).await.map_err(CommandError::unclassified)?;
        }
        Ok(())
    }
}

async fn manual_of(ctx: &MessageContext, name: &str) -> String {
    let mut manuals = Vec::new();
    for command in ctx.registry().resolve(name) {
        if command.is_permitted(ctx).await {
            manuals.push(command.render_manual(ctx.prefix()));
        }
    }
    if manuals.is_empty() {
        format!("No command named `{name}` was found.")
    } else {
        manuals.join("\n\n")
    }
}

async fn listing(ctx: &MessageContext) -> Vec<String> {
    let prefix = ctx.prefix();
    let entries: Vec<String> = ctx
        .registry()
        .visible_to(ctx)
        .await
        .iter()
        .filter_map(|command| {
            command
                .help()
                .map(|help| format!("`{prefix}{}` - {help}", command.name()))
        })
        .collect();

    if entries.is_empty() {
        return vec!["No commands available.".to_string()];
    }

    let page_size = ctx.config().help_page_size.max(1);
    let pages = entries.len().div_ceil(page_size);
    entries
        .chunks(page_size)
        .enumerate()
        .map(|(i, chunk)| {
            let header = if pages > 1 {
                format!("**Commands ({}/{pages})**", i + 1)
            } else {
                "**Commands**".to_string()
            };
            format!("{header}\n{}", chunk.join("\n"))
        })
        .collect()
}
