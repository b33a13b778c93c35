//! Error types for Queuechat
//!
//! This module defines the top-level error taxonomy, using `thiserror`
//! for ergonomic error handling. Transport and backend failures are
//! described by [`ClientError`] and wrapped here when they surface
//! through a user-initiated action.

use crate::api::ClientError;
use thiserror::Error;

/// Main error type for Queuechat operations
///
/// User-initiated actions on the chat controller (`select_chat`,
/// `send_message`, `create_chat`) return this type so callers can
/// match on the failure. Background polling never produces it.
#[derive(Error, Debug)]
pub enum QueuechatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An action that needs a selected chat was invoked without one
    #[error("No chat is selected")]
    NoActiveChat,

    /// Attempted to send a message with no content
    #[error("Message content cannot be empty")]
    EmptyMessage,

    /// Request validation failed before reaching the backend
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport or backend failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl QueuechatError {
    /// Returns true if the failure came from the network layer and a retry
    /// may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_transient())
    }
}

/// Result type alias for Queuechat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = QueuechatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_no_active_chat_display() {
        let error = QueuechatError::NoActiveChat;
        assert_eq!(error.to_string(), "No chat is selected");
    }

    #[test]
    fn test_empty_message_display() {
        let error = QueuechatError::EmptyMessage;
        assert_eq!(error.to_string(), "Message content cannot be empty");
    }

    #[test]
    fn test_client_error_is_transparent() {
        let error: QueuechatError = ClientError::Server {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "Server error (500): boom");
        assert!(error.is_transient());
    }

    #[test]
    fn test_client_rejection_is_not_transient() {
        let error: QueuechatError = ClientError::Server {
            status: 400,
            message: "bad request".to_string(),
        }
        .into();
        assert!(!error.is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: QueuechatError = io_error.into();
        assert!(matches!(error, QueuechatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: QueuechatError = json_error.into();
        assert!(matches!(error, QueuechatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: QueuechatError = yaml_error.into();
        assert!(matches!(error, QueuechatError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueuechatError>();
    }
}
