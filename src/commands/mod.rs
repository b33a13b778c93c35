/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chats`: list, show, and create chats
- `messages`: send a message and follow the reply queue
- `auth`: registration, login, and account commands
*/

use crate::api::ApiClient;
use crate::chat::{ChatSession, MessageRole};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use std::sync::Arc;

pub mod auth;
pub mod chats;
pub mod messages;

/// Builds the shared backend client from configuration.
pub(crate) fn build_client(config: &Config) -> Result<Arc<ApiClient>> {
    Ok(Arc::new(ApiClient::new(&config.api)?))
}

/// Serialize a value into pretty JSON and print it.
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(crate::QueuechatError::Serialization)?;
    println!("{}", json);
    Ok(())
}

/// Human-readable queue status line for a chat.
pub(crate) fn queue_status(session: &ChatSession) -> String {
    if session.in_queue() {
        format!("queued at position {}", session.queue_position)
            .yellow()
            .to_string()
    } else {
        "answered".green().to_string()
    }
}

/// Prints one message with a role tag.
pub(crate) fn print_message(role: MessageRole, content: &str) {
    let tag = match role {
        MessageRole::User => "you".cyan(),
        MessageRole::Assistant => "assistant".green(),
        MessageRole::System => "system".magenta(),
    };
    println!("[{}] {}", tag, content);
}
