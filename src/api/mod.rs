//! Backend REST API
//!
//! [`ApiClient`] is the HTTP boundary of the crate: chats, messages,
//! authentication, and account endpoints. The chat controller only sees it
//! through the [`MessageClient`](crate::chat::MessageClient) trait.

pub mod client;
pub mod types;

pub use client::{ApiClient, ClientError, SESSION_COOKIE};
pub use types::{LoginSession, SystemRole, UserProfile};
