//! Error types for argument parsing, command dispatch and registration.
//!
//! Dispatch failures are split into the kinds a chat front-end reports
//! differently: a rejected argument, trailing input, a failed permission
//! predicate, and everything else a handler may raise.

use thiserror::Error;

use crate::argument::Argument;

/// An argument's constraint rejected its input.
///
/// Carries a copy of the offending [`Argument`] so callers can render
/// targeted usage help.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    argument: Box<Argument>,
    message: String,
}

impl ParseError {
    /// Create a new parse error for `argument`.
    pub fn new(argument: &Argument, message: impl Into<String>) -> Self {
        Self {
            argument: Box::new(argument.clone()),
            message: message.into(),
        }
    }

    /// The argument whose constraint failed.
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// Human-readable description of the violated constraint.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while dispatching a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required argument failed validation.
    #[error("Invalid value for `{}`: {}", .0.argument().display(), .0.message())]
    Parse(#[from] ParseError),

    /// Input was left over after every argument was processed.
    #[error("Too many arguments")]
    TooManyArguments {
        /// First error recorded while an optional argument fell back to its default.
        first_optional: Option<ParseError>,
    },

    /// A permission predicate rejected the caller.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Anything else a handler or collaborator failed with.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl CommandError {
    /// Create a permission error with the given reason.
    pub fn permission(reason: impl Into<String>) -> Self {
        Self::Permission(reason.into())
    }

    /// Wrap an arbitrary error as unclassified.
    pub fn unclassified(err: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified(err.into())
    }

    /// Whether the error may be shown to the end user verbatim.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Unclassified(_))
    }
}

/// Errors raised while registering commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Command name is empty or contains whitespace.
    #[error("Invalid command name: '{0}'")]
    InvalidName(String),

    /// Another command already answers to this name.
    #[error("Command '{0}' is already registered")]
    NameTaken(String),

    /// An argument name is not made of `[A-Za-z0-9_]`.
    #[error("Invalid argument name '{argument}' on command '{command}'")]
    InvalidArgumentName {
        /// Command being registered.
        command: String,
        /// Offending argument name.
        argument: String,
    },

    /// Two arguments of one command share a name.
    #[error("Argument '{argument}' is declared more than once on command '{command}'")]
    DuplicateArgument {
        /// Command being registered.
        command: String,
        /// Duplicated argument name.
        argument: String,
    },
}

/// Errors raised while creating arguments from a type tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The tag is not one of `string`, `number` or `rest`.
    #[error("Unknown argument type: '{0}'")]
    UnknownType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let arg: Argument = Argument::string("count").display("amount").into();
        let err = ParseError::new(&arg, "must be at least 2 characters long");
        assert_eq!(err.to_string(), "must be at least 2 characters long");

        let err = CommandError::from(err);
        assert_eq!(
            err.to_string(),
            "Invalid value for `amount`: must be at least 2 characters long"
        );
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_unclassified_is_not_user_facing() {
        let err = CommandError::unclassified(anyhow::anyhow!("database exploded"));
        assert!(!err.is_user_facing());
        assert_eq!(err.to_string(), "database exploded");
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::NameTaken("ping".to_string());
        assert_eq!(err.to_string(), "Command 'ping' is already registered");

        let err = RegistryError::InvalidArgumentName {
            command: "echo".to_string(),
            argument: "bad name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid argument name 'bad name' on command 'echo'"
        );
    }
}
