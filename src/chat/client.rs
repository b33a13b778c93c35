//! Message client abstraction
//!
//! [`MessageClient`] is the only way the poller and the controller reach
//! the backend. [`ApiClient`] implements it over HTTP; tests use
//! [`FakeMessageClient`](crate::chat::fake::FakeMessageClient).

use crate::api::{ApiClient, ClientError};
use crate::chat::session::{ChatId, ChatSession, ChatSummary, CreateChatRequest};
use async_trait::async_trait;

/// Backend operations needed by the chat core
///
/// Every method fails with `ClientError::Network` on transport failure and
/// with one of the status variants when the backend rejects the request.
#[async_trait]
pub trait MessageClient: Send + Sync + 'static {
    /// Appends a user message and returns the full updated snapshot.
    async fn send_message(&self, chat_id: ChatId, content: &str)
        -> Result<ChatSession, ClientError>;

    /// Fetches the full snapshot of a chat.
    async fn fetch_chat(&self, chat_id: ChatId) -> Result<ChatSession, ClientError>;

    /// Lists the user's chats.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError>;

    /// Creates a chat and returns its first snapshot.
    async fn create_chat(&self, request: &CreateChatRequest) -> Result<ChatSession, ClientError>;
}

#[async_trait]
impl MessageClient for ApiClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        content: &str,
    ) -> Result<ChatSession, ClientError> {
        ApiClient::send_message(self, chat_id, content).await
    }

    async fn fetch_chat(&self, chat_id: ChatId) -> Result<ChatSession, ClientError> {
        ApiClient::fetch_chat(self, chat_id).await
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        ApiClient::list_chats(self).await
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<ChatSession, ClientError> {
        ApiClient::create_chat(self, request).await
    }
}
