//! Platform-level capabilities a command needs in the invoking channel.

use bitflags::bitflags;

bitflags! {
    /// Set of capability bits granted to (or required from) the bot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u64 {
        const VIEW_CHANNEL = 1 << 0;
        const SEND_MESSAGES = 1 << 1;
        const EMBED_LINKS = 1 << 2;
        const ATTACH_FILES = 1 << 3;
        const ADD_REACTIONS = 1 << 4;
        const READ_MESSAGE_HISTORY = 1 << 5;
        const MANAGE_MESSAGES = 1 << 6;
        const MENTION_EVERYONE = 1 << 7;
        const USE_EXTERNAL_EMOJIS = 1 << 8;
        const CONNECT = 1 << 9;
        const SPEAK = 1 << 10;
    }
}

impl Capabilities {
    /// Capabilities in `self` that `granted` does not cover.
    pub fn missing_from(self, granted: Capabilities) -> Capabilities {
        self.difference(granted)
    }

    /// Human-readable names, e.g. `["Send Messages", "Embed Links"]`.
    pub fn display_names(self) -> Vec<String> {
        self.iter_names().map(|(name, _)| humanize(name)).collect()
    }

    /// Comma-separated human-readable names.
    pub fn describe(self) -> String {
        self.display_names().join(", ")
    }
}

fn humanize(flag: &str) -> String {
    flag.split('_')
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
