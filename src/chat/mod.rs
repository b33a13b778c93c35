//! Chat core: data model, backend boundary, queue polling, and the controller
//!
//! # Overview
//!
//! 1. [`ChatController`] owns the selected chat and is the only component
//!    that mutates it.
//! 2. Sends and selections go to the backend through a [`MessageClient`].
//! 3. When a snapshot reports `queue_position > 0`, the controller asks the
//!    [`QueuePoller`] to refresh the chat until the position reaches 0.
//! 4. Poll results flow back through the controller, which drops any result
//!    for a chat that is no longer selected.
//!
//! # Modules
//!
//! - [`session`]: `ChatSession`, `Message`, and request types
//! - [`client`]: the `MessageClient` trait
//! - [`poller`]: per-chat poll loops
//! - [`store`]: selected-chat state and observers
//! - [`controller`]: orchestration and staleness guard
//! - [`fake`]: scriptable in-memory client for tests

pub mod client;
pub mod controller;
pub mod fake;
pub mod poller;
pub mod session;
pub mod store;

pub use client::MessageClient;
pub use controller::ChatController;
pub use poller::{PollSink, QueuePoller};
pub use session::{
    ChatEvent, ChatId, ChatSession, ChatSummary, CreateChatRequest, Message, MessageRole,
};
pub use store::{ObserverId, RequestStamp, SessionStore};
