//! Command registry for managing registered commands.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::argument::is_valid_argument_name;
use crate::command::{Command, CommandBuilder, Invocation};
use crate::error::RegistryError;

/// Check a command name or alias: non-empty and free of whitespace.
pub fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Registry of commands.
///
/// Names and aliases are unique registry-wide and matched
/// case-insensitively. Registering a taken name is an error; adding a
/// taken alias silently drops it. Once the registry is shared behind an
/// `Arc` it can no longer change.
pub struct CommandRegistry<C> {
    commands: Vec<Arc<Command<C>>>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<C> std::fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands)
            .finish()
    }
}

impl<C: Invocation> CommandRegistry<C> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `name` is free and valid.
    pub fn can_register(&self, name: &str) -> bool {
        is_valid_command_name(name) && !self.is_taken(name)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.commands.iter().any(|cmd| cmd.matches(name))
    }

    /// Start building a command named `name`.
    ///
    /// Fails if the name is invalid or already answered to.
    pub fn command(&self, name: &str) -> Result<CommandBuilder<C>, RegistryError> {
        self.check_name(name)?;
        Ok(CommandBuilder::new(name))
    }

    fn check_name(&self, name: &str) -> Result<(), RegistryError> {
        if !is_valid_command_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.is_taken(name) {
            return Err(RegistryError::NameTaken(name.to_lowercase()));
        }
        Ok(())
    }

    /// Finalize and store a command.
    ///
    /// The name is checked again; arguments must have valid, unique names.
    /// Aliases that are invalid or already taken are dropped.
    pub fn register(&mut self, mut builder: CommandBuilder<C>) -> Result<(), RegistryError> {
        self.check_name(builder.name())?;

        let mut seen = HashSet::new();
        for argument in builder.arguments() {
            if !is_valid_argument_name(argument.name()) {
                return Err(RegistryError::InvalidArgumentName {
                    command: builder.name().to_string(),
                    argument: argument.name().to_string(),
                });
            }
            if !seen.insert(argument.name()) {
                return Err(RegistryError::DuplicateArgument {
                    command: builder.name().to_string(),
                    argument: argument.name().to_string(),
                });
            }
        }

        let aliases = builder.take_aliases();
        let mut command = builder.build();
        for alias in aliases {
            if self.alias_available(&command, &alias) {
                command.push_alias(alias);
            } else {
                debug!(command = %command.name(), alias = %alias, "Dropping unavailable alias");
            }
        }

        debug!(command = %command.name(), aliases = ?command.aliases(), "Registered command");
        self.commands.push(Arc::new(command));
        Ok(())
    }

    fn alias_available(&self, command: &Command<C>, alias: &str) -> bool {
        is_valid_command_name(alias) && !command.matches(alias) && !self.is_taken(alias)
    }

    /// Add an alias to a registered command.
    ///
    /// Returns `false`, without error, when the command is unknown or the
    /// alias is invalid or already taken.
    pub fn add_alias(&mut self, command: &str, alias: &str) -> bool {
        let alias = alias.to_lowercase();
        let Some(index) = self.commands.iter().position(|c| c.name() == command.to_lowercase())
        else {
            return false;
        };
        if !self.alias_available(&self.commands[index], &alias) {
            debug!(command, alias = %alias, "Dropping unavailable alias");
            return false;
        }
        Arc::make_mut(&mut self.commands[index]).push_alias(alias);
        true
    }

    /// Every command answering to `name`, by name or alias.
    pub fn resolve(&self, name: &str) -> Vec<Arc<Command<C>>> {
        self.commands
            .iter()
            .filter(|cmd| cmd.matches(name))
            .cloned()
            .collect()
    }

    /// First command answering to `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Command<C>>> {
        self.commands.iter().find(|cmd| cmd.matches(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.is_taken(name)
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command<C>>> {
        self.commands.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|cmd| cmd.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Find commands whose name or alias starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<Arc<Command<C>>> {
        let prefix = prefix.to_lowercase();
        self.commands
            .iter()
            .filter(|cmd| cmd.all_names().any(|n| n.starts_with(&prefix)))
            .cloned()
            .collect()
    }

    /// Commands whose permission predicates all pass for `ctx`.
    pub async fn visible_to(&self, ctx: &C) -> Vec<Arc<Command<C>>> {
        let mut visible = Vec::new();
        for cmd in &self.commands {
            if cmd.is_permitted(ctx).await {
                visible.push(cmd.clone());
            }
        }
        visible
    }

    /// Manual of every command answering to `name`, or `None` if none does.
    pub fn render_manual(&self, name: &str, prefix: &str) -> Option<String> {
        let matches = self.resolve(name);
        if matches.is_empty() {
            return None;
        }
        Some(
            matches
                .iter()
                .map(|cmd| cmd.render_manual(prefix))
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::argument::Argument;
    use crate::capability::Capabilities;

    struct Ctx {
        admin: bool,
    }

    #[async_trait]
    impl Invocation for Ctx {
        async fn granted_capabilities(&self) -> anyhow::Result<Capabilities> {
            Ok(Capabilities::all())
        }
    }

    fn registry_with(names: &[&str]) -> CommandRegistry<Ctx> {
        let mut registry = CommandRegistry::new();
        for name in names {
            let builder = registry.command(name).unwrap();
            registry.register(builder).unwrap();
        }
        registry
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = registry_with(&["ping", "echo"]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["ping", "echo"]);
        assert_eq!(registry.resolve("PING").len(), 1);
        assert!(registry.resolve("pong").is_empty());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let registry = registry_with(&[]);

        assert_eq!(
            registry.command("").unwrap_err(),
            RegistryError::InvalidName(String::new())
        );
        assert_eq!(
            registry.command("two words").unwrap_err(),
            RegistryError::InvalidName("two words".to_string())
        );
        assert!(!registry.can_register("tab\tname"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = registry_with(&["ping"]);

        assert_eq!(
            registry.command("Ping").unwrap_err(),
            RegistryError::NameTaken("ping".to_string())
        );
        assert!(!registry.can_register("PING"));

        // a builder created before the collision is rejected at registration
        let builder = CommandBuilder::new("ping");
        assert!(registry.register(builder).is_err());
    }

    #[test]
    fn test_alias_collision_silently_dropped() {
        let mut registry = registry_with(&["a"]);

        let builder = registry.command("b").unwrap().alias("a").alias("bee");
        registry.register(builder).unwrap();

        let b = registry.get("b").unwrap();
        assert_eq!(b.aliases(), &["bee".to_string()]);
        assert_eq!(registry.resolve("a").len(), 1);
        assert_eq!(registry.resolve("a")[0].name(), "a");
    }

    #[test]
    fn test_alias_rules() {
        let mut registry = registry_with(&["a", "b"]);

        assert!(registry.add_alias("b", "Second"));
        assert!(!registry.add_alias("b", "a"));
        assert!(!registry.add_alias("b", "second"));
        assert!(!registry.add_alias("b", "b"));
        assert!(!registry.add_alias("b", "has space"));
        assert!(!registry.add_alias("missing", "x"));

        assert_eq!(registry.get("SECOND").unwrap().name(), "b");
        assert!(!registry.can_register("second"));
    }

    #[test]
    fn test_argument_names_validated() {
        let mut registry = registry_with(&[]);

        let builder = registry
            .command("echo")
            .unwrap()
            .argument(Argument::string("bad-name"));
        assert_eq!(
            registry.register(builder).unwrap_err(),
            RegistryError::InvalidArgumentName {
                command: "echo".to_string(),
                argument: "bad-name".to_string(),
            }
        );

        let builder = registry
            .command("echo")
            .unwrap()
            .argument(Argument::string("text"))
            .argument(Argument::rest("text"));
        assert!(matches!(
            registry.register(builder),
            Err(RegistryError::DuplicateArgument { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_find_by_prefix() {
        let mut registry = registry_with(&["build", "bump", "test"]);
        registry.add_alias("test", "butest");

        assert_eq!(registry.find_by_prefix("bu").len(), 3);
        assert_eq!(registry.find_by_prefix("te").len(), 1);
    }

    #[tokio::test]
    async fn test_visible_to_filters_by_permission() {
        let mut registry = CommandRegistry::new();
        let open = registry.command("open").unwrap();
        registry.register(open).unwrap();
        let admin = registry
            .command("admin")
            .unwrap()
            .check_permission_fn(|ctx: &Ctx| ctx.admin);
        registry.register(admin).unwrap();

        let visible = registry.visible_to(&Ctx { admin: false }).await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name(), "open");

        assert_eq!(registry.visible_to(&Ctx { admin: true }).await.len(), 2);
    }

    #[test]
    fn test_render_manual() {
        let mut registry = registry_with(&[]);
        let builder = registry
            .command("echo")
            .unwrap()
            .manual("Repeats the text back.")
            .argument(Argument::rest("text"));
        registry.register(builder).unwrap();

        assert_eq!(
            registry.render_manual("ECHO", "!").unwrap(),
            "**!echo**\nUsage: `!echo <text...>`\nRepeats the text back."
        );
        assert!(registry.render_manual("nope", "!").is_none());
    }
}
