//! Error types for the chat server
//!
//! Defines application-level errors and outbound delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// command errors (reported to the issuing client as one line).
/// The `Display` text of the command errors is what the client sees.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error, including over-long lines (fatal)
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// Invalid configuration value (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Handshake name was empty or whitespace only
    #[error("Invalid username.")]
    InvalidUsername,

    /// Handshake name is held by an active session
    #[error("Username '{0}' is not available.")]
    UsernameTaken(String),

    /// Command recognised but its arguments are malformed
    #[error("Invalid format. Usage: {usage}")]
    InvalidFormat {
        /// Expected form of the command
        usage: &'static str,
    },

    /// Unrecognised sub-command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Private message target is not connected
    #[error("User '{0}' not found.")]
    UserNotFound(String),

    /// Group name already in use
    #[error("Group '{0}' already exists.")]
    GroupExists(String),

    /// No group with the given name
    #[error("Group '{0}' not found.")]
    GroupNotFound(String),

    /// Sender does not belong to any group
    #[error("You are not in any group.")]
    NotInGroup,
}

impl AppError {
    /// Whether this error tears down the connection
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Io(_) | AppError::Codec(_) | AppError::Config(_))
    }
}

/// Message send errors
///
/// Occurs when a line cannot be queued on a session's outbound channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_errors_are_not_fatal() {
        assert!(!AppError::NotInGroup.is_fatal());
        assert!(!AppError::UserNotFound("bob".to_string()).is_fatal());
        assert!(!AppError::InvalidFormat { usage: "@<name> <message>" }.is_fatal());
    }

    #[test]
    fn test_transport_errors_are_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(AppError::from(io).is_fatal());
        assert!(AppError::from(LinesCodecError::MaxLineLengthExceeded).is_fatal());
    }

    #[test]
    fn test_error_text() {
        assert_eq!(
            AppError::GroupExists("team".to_string()).to_string(),
            "Group 'team' already exists."
        );
        assert_eq!(
            AppError::InvalidFormat { usage: "/group msg <message>" }.to_string(),
            "Invalid format. Usage: /group msg <message>"
        );
    }
}
