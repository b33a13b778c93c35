//! Queuechat - terminal client library for a queued chat backend
//!
//! The backend answers chat messages through a processing queue: sending a
//! message returns the chat with a queue position, and the reply appears
//! once that position reaches 0. This library provides the client side of
//! that protocol, including the polling state machine that follows a
//! queued chat until its reply is ready.
//!
//! # Architecture
//!
//! - `chat`: chat model, `MessageClient` boundary, queue poller, controller
//! - `api`: HTTP client for chats, auth, and account endpoints
//! - `commands`: CLI command handlers
//! - `config`: configuration management and validation
//! - `logging`: tracing subscriber setup
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use queuechat::api::ApiClient;
//! use queuechat::chat::{ChatController, ChatId};
//! use queuechat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = Arc::new(ApiClient::new(&config.api)?);
//!     let controller = ChatController::from_config(client, &config.polling);
//!     controller.on_chat_updated(|chat| println!("queue: {}", chat.queue_position));
//!
//!     controller.select_chat(ChatId(1)).await?;
//!     controller.send_message("Hello!").await?;
//!
//!     controller.dispose();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use api::{ApiClient, ClientError};
pub use chat::{ChatController, ChatId, ChatSession, MessageClient, QueuePoller};
pub use config::Config;
pub use error::{QueuechatError, Result};
