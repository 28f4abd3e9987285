//! Parsed argument sets and the argument-chain algorithm.

use std::collections::HashMap;

use tracing::debug;

use crate::argument::{ArgValue, Argument};
use crate::error::{CommandError, ParseError};

/// Values produced by validating a command's arguments against raw input.
///
/// Optional arguments that fell back to their default leave their
/// [`ParseError`] in [`errors`](Self::errors).
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    values: HashMap<String, ArgValue>,
    errors: Vec<ParseError>,
}

impl ParsedArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the argument chain over `raw`.
    ///
    /// Arguments are consumed left to right without backtracking. A required
    /// argument that fails aborts the chain; an optional one records the
    /// error, takes its default (if any) and leaves the input untouched for
    /// the next argument. Input left over at the end fails with
    /// [`CommandError::TooManyArguments`].
    pub fn parse(arguments: &[Argument], raw: &str) -> Result<Self, CommandError> {
        let mut parsed = Self::new();
        let mut remaining = raw.trim();

        for argument in arguments {
            match argument.validate(remaining) {
                Ok((value, rest)) => {
                    parsed.insert(argument.name(), value);
                    remaining = rest.trim();
                }
                Err(err) if argument.is_optional() => {
                    debug!(
                        argument = argument.name(),
                        error = %err,
                        "Optional argument fell back to its default"
                    );
                    if let Some(default) = argument.default_value() {
                        parsed.insert(argument.name(), default.clone());
                    }
                    parsed.errors.push(err);
                }
                Err(err) => return Err(CommandError::Parse(err)),
            }
        }

        if !remaining.is_empty() {
            return Err(CommandError::TooManyArguments {
                first_optional: parsed.errors.first().cloned(),
            });
        }

        Ok(parsed)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Text value of `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    /// Numeric value of `name`.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    /// Integer value of `name`.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Errors recorded by optional arguments, in argument order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
