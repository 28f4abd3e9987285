//! Command definitions and argument validation for Herald.
//!
//! This crate is transport-agnostic: it knows nothing about messages,
//! channels or prefixes beyond the strings it is handed. It provides:
//! - Typed argument validators (`string`, `number`, `rest`)
//! - The argument chain that turns raw text into [`ParsedArgs`]
//! - Commands with permission predicates, capability requirements and
//!   concurrent handlers
//! - The [`CommandRegistry`] resolving names and aliases
//!
//! # Dispatch guard
//!
//! [`Command::dispatch`] runs, in order:
//! 1. Every permission predicate (all must pass)
//! 2. The argument chain
//! 3. The capability check against the invoking channel
//! 4. Every handler, concurrently
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_commands::{Argument, CommandRegistry};
//!
//! let mut registry = CommandRegistry::new();
//! let echo = registry
//!     .command("echo")?
//!     .alias("say")
//!     .argument(Argument::rest("text"))
//!     .exec_fn(|ctx: &MyContext, args| {
//!         let text = args.text("text").unwrap_or_default().to_string();
//!         ctx.reply(text)
//!     });
//! registry.register(echo)?;
//! ```

pub mod args;
pub mod argument;
pub mod capability;
pub mod command;
pub mod error;
pub mod registry;

// Re-export main types
pub use args::ParsedArgs;
pub use argument::{
    ArgValue, Argument, ArgumentKind, ArgumentType, CaseFold, NumberArgument, Sign, TextArgument,
};
pub use capability::Capabilities;
pub use command::{
    Command, CommandBuilder, Dispatched, Handler, HandlerResult, Invocation, Permission,
};
pub use error::{ArgumentError, CommandError, ParseError, RegistryError};
pub use registry::{CommandRegistry, is_valid_command_name};
