//! Error types for the bot runtime.

use thiserror::Error;

/// Errors that can occur outside of a command's own execution.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Prefix storage failed to read or write.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The chat transport failed to deliver or resolve something.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A command did not settle in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Persistence(err.to_string())
    }
}

impl From<toml::de::Error> for BotError {
    fn from(err: toml::de::Error) -> Self {
        BotError::Config(format!("Invalid config file: {}", err))
    }
}

/// Result type for bot operations.
pub type BotResult<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BotError::Persistence("disk full".to_string());
        assert_eq!(err.to_string(), "Persistence error: disk full");

        let err = BotError::Timeout("ping".to_string());
        assert_eq!(err.to_string(), "Operation timed out: ping");
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(matches!(BotError::from(io), BotError::Persistence(_)));
    }
}
