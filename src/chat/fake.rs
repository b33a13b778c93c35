//! In-process fake message client for unit and integration tests
//!
//! [`FakeMessageClient`] implements [`MessageClient`] without any network
//! I/O. Tests seed chat snapshots, script per-chat responses, inspect the
//! calls the code under test made, and can hold fetches in flight to
//! exercise the staleness guard.
//!
//! Outcomes are consumed in order from the per-chat script. When a chat's
//! script is empty, `fetch_chat` returns the last seeded snapshot.
//!
//! # Example
//!
//! ```
//! use queuechat::chat::fake::{chat_snapshot, FakeMessageClient};
//! use queuechat::chat::{ChatId, MessageClient};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fake = FakeMessageClient::new();
//! fake.insert_chat(chat_snapshot(1, 0));
//! fake.script_fetch(ChatId(1), Ok(chat_snapshot(1, 2)));
//!
//! assert_eq!(fake.fetch_chat(ChatId(1)).await.unwrap().queue_position, 2);
//! assert_eq!(fake.fetch_chat(ChatId(1)).await.unwrap().queue_position, 0);
//! assert_eq!(fake.fetch_count(ChatId(1)), 2);
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use crate::api::ClientError;
use crate::chat::client::MessageClient;
use crate::chat::session::{
    ChatId, ChatSession, ChatSummary, CreateChatRequest, Message, MessageRole,
};

type Outcome = Result<ChatSession, ClientError>;

#[derive(Default)]
struct FakeState {
    chats: HashMap<ChatId, ChatSession>,
    fetch_script: HashMap<ChatId, VecDeque<Outcome>>,
    send_script: HashMap<ChatId, VecDeque<Outcome>>,
    fetch_calls: HashMap<ChatId, usize>,
    sent: Vec<(ChatId, String)>,
    gates: HashMap<ChatId, Arc<Semaphore>>,
    next_id: u64,
}

/// Scriptable in-memory [`MessageClient`].
#[derive(Default)]
pub struct FakeMessageClient {
    state: Mutex<FakeState>,
}

/// Holds fetches for one chat in flight until released.
#[derive(Debug, Clone)]
pub struct FetchGate {
    semaphore: Arc<Semaphore>,
}

impl FetchGate {
    /// Lets one held (or future) fetch complete.
    pub fn release_one(&self) {
        self.semaphore.add_permits(1);
    }

    /// Lets every held fetch complete.
    pub fn open(&self) {
        self.semaphore.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

impl FakeMessageClient {
    /// Creates an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the first failure.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seeds or replaces the stored snapshot of a chat.
    pub fn insert_chat(&self, chat: ChatSession) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(chat.id.0);
        state.chats.insert(chat.id, chat);
    }

    /// Queues the outcome of the next unscripted `fetch_chat` for `chat_id`.
    pub fn script_fetch(&self, chat_id: ChatId, outcome: Outcome) {
        self.lock()
            .fetch_script
            .entry(chat_id)
            .or_default()
            .push_back(outcome);
    }

    /// Queues the outcome of the next `send_message` for `chat_id`.
    pub fn script_send(&self, chat_id: ChatId, outcome: Outcome) {
        self.lock()
            .send_script
            .entry(chat_id)
            .or_default()
            .push_back(outcome);
    }

    /// Makes every later fetch for `chat_id` wait on the returned gate.
    ///
    /// The call is counted before the fetch blocks.
    pub fn hold_fetches(&self, chat_id: ChatId) -> FetchGate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.lock().gates.insert(chat_id, semaphore.clone());
        FetchGate { semaphore }
    }

    /// Number of `fetch_chat` calls made for `chat_id`.
    pub fn fetch_count(&self, chat_id: ChatId) -> usize {
        self.lock().fetch_calls.get(&chat_id).copied().unwrap_or(0)
    }

    /// Messages passed to `send_message`, in call order.
    pub fn sent_messages(&self) -> Vec<(ChatId, String)> {
        self.lock().sent.clone()
    }
}

#[async_trait]
impl MessageClient for FakeMessageClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        content: &str,
    ) -> Result<ChatSession, ClientError> {
        let scripted = {
            let mut state = self.lock();
            state.sent.push((chat_id, content.to_string()));
            state
                .send_script
                .get_mut(&chat_id)
                .and_then(|queue| queue.pop_front())
        };

        if let Some(outcome) = scripted {
            if let Ok(chat) = &outcome {
                self.lock().chats.insert(chat_id, chat.clone());
            }
            return outcome;
        }

        let mut state = self.lock();
        let chat = state
            .chats
            .get_mut(&chat_id)
            .ok_or_else(|| ClientError::NotFound(format!("/chats/{}/messages", chat_id)))?;
        chat.messages.push(Message {
            id: Some(chat.messages.len() as u64 + 1),
            content: content.to_string(),
            role: MessageRole::User,
            created_at: Utc::now(),
        });
        chat.queue_position = 1;
        chat.updated_at = Utc::now();
        Ok(chat.clone())
    }

    async fn fetch_chat(&self, chat_id: ChatId) -> Result<ChatSession, ClientError> {
        let gate = {
            let mut state = self.lock();
            *state.fetch_calls.entry(chat_id).or_insert(0) += 1;
            state.gates.get(&chat_id).cloned()
        };

        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut state = self.lock();
        if let Some(outcome) = state
            .fetch_script
            .get_mut(&chat_id)
            .and_then(|queue| queue.pop_front())
        {
            if let Ok(chat) = &outcome {
                state.chats.insert(chat_id, chat.clone());
            }
            return outcome;
        }

        state
            .chats
            .get(&chat_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/chats/{}", chat_id)))
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        let state = self.lock();
        let mut chats: Vec<ChatSummary> = state
            .chats
            .values()
            .map(|c| ChatSummary {
                id: c.id,
                title: c.title.clone(),
                updated_at: c.updated_at,
            })
            .collect();
        chats.sort_by_key(|c| c.id);
        Ok(chats)
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<ChatSession, ClientError> {
        let mut state = self.lock();
        state.next_id += 1;
        let mut chat = chat_snapshot(state.next_id, 0);
        chat.title = request.title.clone();
        chat.messages.clear();
        state.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }
}

/// Builds a snapshot whose message log is consistent with its queue position.
///
/// Queued chats end with an unanswered user message; answered chats end with
/// an assistant reply.
pub fn chat_snapshot(id: u64, queue_position: u32) -> ChatSession {
    let now = Utc::now();
    let mut messages = vec![Message {
        id: Some(1),
        content: "question".to_string(),
        role: MessageRole::User,
        created_at: now,
    }];
    if queue_position == 0 {
        messages.push(Message {
            id: Some(2),
            content: "answer".to_string(),
            role: MessageRole::Assistant,
            created_at: now,
        });
    }

    ChatSession {
        id: ChatId(id),
        title: format!("chat {}", id),
        messages,
        events: Vec::new(),
        queue_position,
        created_at: now,
        updated_at: now,
    }
}

/// Transport failure as the HTTP client would report it.
pub fn network_error() -> ClientError {
    ClientError::Network("connection refused".to_string())
}
