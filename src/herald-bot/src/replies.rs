//! User-facing reply texts.

use herald_commands::{Capabilities, Command, CommandError, Invocation, ParseError};

/// Reply to a message that mentions only the bot.
pub fn prefix_help(prefix: &str) -> String {
    format!("My prefix here is `{prefix}`. Use `{prefix}help` to see what I can do.")
}

fn help_hint<C: Invocation>(command: &Command<C>, prefix: &str) -> String {
    format!(
        "Usage: `{}`\nSee `{prefix}help {}` for details.",
        command.usage(prefix),
        command.name()
    )
}

/// Reply for a user-facing dispatch failure.
///
/// Returns `None` for unclassified errors, which are never shown verbatim.
pub fn command_error<C: Invocation>(
    command: &Command<C>,
    error: &CommandError,
    prefix: &str,
) -> Option<String> {
    let text = match error {
        CommandError::Parse(_) => format!("{error}\n{}", help_hint(command, prefix)),
        CommandError::TooManyArguments { first_optional } => {
            let mut text = format!("{error}.");
            if let Some(skipped) = first_optional {
                text.push(' ');
                text.push_str(&skipped_note(skipped));
            }
            format!("{text}\n{}", help_hint(command, prefix))
        }
        CommandError::Permission(_) => format!("{error}."),
        CommandError::Unclassified(_) => return None,
    };
    Some(text)
}

fn skipped_note(error: &ParseError) -> String {
    format!(
        "`{}` was skipped: {}.",
        error.argument().display(),
        error.message()
    )
}

/// Opaque reply for an unclassified failure.
pub fn unclassified(command: &str, timestamp_millis: i64) -> String {
    format!(
        "Sorry, something went wrong while running `{command}`. \
         Please report this with reference `{timestamp_millis}`."
    )
}

/// Report of capabilities the bot lacks in a channel.
pub fn missing_capabilities(command: &str, channel: &str, missing: Capabilities) -> String {
    format!(
        "I can't run `{command}` in <#{channel}>, I'm missing these permissions: {}.",
        missing.describe()
    )
}
