//! Inbound chat messages as seen by the dispatcher.

use serde::{Deserialize, Serialize};

/// Entities mentioned in a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentions {
    /// Mentioned user IDs.
    #[serde(default)]
    pub users: Vec<String>,
    /// Mentioned role IDs.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Mentioned channel IDs.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Whether `@everyone` or `@here` was used.
    #[serde(default)]
    pub everyone: bool,
}

impl Mentions {
    /// Check if `user` is the only thing mentioned.
    pub fn is_only(&self, user: &str) -> bool {
        !self.everyone
            && self.roles.is_empty()
            && self.channels.is_empty()
            && !self.users.is_empty()
            && self.users.iter().all(|u| u == user)
    }
}

/// A message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Guild the message was posted in; `None` for direct messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild: Option<String>,
    /// Channel the message was posted in.
    pub channel: String,
    /// Author user ID; `None` for system or webhook messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// Raw text of the message.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mentions: Mentions,
}

impl InboundMessage {
    /// Create a guild message.
    pub fn new(
        guild: impl Into<String>,
        channel: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            guild: Some(guild.into()),
            channel: channel.into(),
            author: Some(author.into()),
            author_is_bot: false,
            content: content.into(),
            mentions: Mentions::default(),
        }
    }

    /// Create a direct message (no guild).
    pub fn direct(
        channel: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            guild: None,
            ..Self::new("", channel, author, content)
        }
    }

    pub fn with_mentions(mut self, mentions: Mentions) -> Self {
        self.mentions = mentions;
        self
    }

    /// Mark the author as a bot account.
    pub fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }

    pub fn without_author(mut self) -> Self {
        self.author = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentioning(users: &[&str]) -> Mentions {
        Mentions {
            users: users.iter().map(|u| u.to_string()).collect(),
            ..Mentions::default()
        }
    }

    #[test]
    fn test_mentions_only_bot() {
        assert!(mentioning(&["bot"]).is_only("bot"));
        assert!(!mentioning(&["bot", "alice"]).is_only("bot"));
        assert!(!mentioning(&[]).is_only("bot"));

        let with_role = Mentions {
            roles: vec!["mods".to_string()],
            ..mentioning(&["bot"])
        };
        assert!(!with_role.is_only("bot"));

        let with_everyone = Mentions {
            everyone: true,
            ..mentioning(&["bot"])
        };
        assert!(!with_everyone.is_only("bot"));
    }

    #[test]
    fn test_direct_message_has_no_guild() {
        let msg = InboundMessage::direct("dm-1", "alice", "hi");
        assert!(msg.guild.is_none());
        assert_eq!(msg.author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_message_deserialize_defaults() {
        let json = r#"{"channel": "c1", "guild": "g1", "author": "u1", "content": "!ping"}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg, InboundMessage::new("g1", "c1", "u1", "!ping"));
    }
}
