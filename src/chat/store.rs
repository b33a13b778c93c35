//! State container for the chat controller
//!
//! [`SessionStore`] holds the selected chat, its latest accepted snapshot,
//! the chat list, and the registered update observers. It is owned by one
//! [`ChatController`](crate::chat::ChatController); there is no global
//! instance.

use crate::chat::session::{ChatId, ChatSession, ChatSummary};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifier returned when registering an observer
pub type ObserverId = u64;

/// Issue order of a backend request; later requests get larger stamps
pub type RequestStamp = u64;

type Observer = Arc<dyn Fn(&ChatSession) + Send + Sync>;

/// Mutable part of the store
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Chat the user currently has selected
    pub active_id: Option<ChatId>,
    /// Latest accepted snapshot of the selected chat
    pub active: Option<ChatSession>,
    /// Chat list as last refreshed
    pub chats: Vec<ChatSummary>,
    /// Last stamp handed out
    last_issued: RequestStamp,
    /// Stamp of the newest result applied per chat
    applied: HashMap<ChatId, RequestStamp>,
}

impl StoreState {
    /// Stamps a request about to be issued.
    pub fn issue(&mut self) -> RequestStamp {
        self.last_issued += 1;
        self.last_issued
    }

    /// Records `stamp` as applied for `chat_id` unless a newer request's
    /// result was applied already. Returns false for an outdated result.
    pub fn claim(&mut self, chat_id: ChatId, stamp: RequestStamp) -> bool {
        let newest = self.applied.entry(chat_id).or_insert(0);
        if stamp < *newest {
            return false;
        }
        *newest = stamp;
        true
    }
}

/// Selected-chat state plus update observers
#[derive(Default)]
pub struct SessionStore {
    state: Mutex<StoreState>,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
}

impl SessionStore {
    /// Creates an empty store with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn observers(&self) -> MutexGuard<'_, Vec<(ObserverId, Observer)>> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Currently selected chat id.
    pub fn active_id(&self) -> Option<ChatId> {
        self.lock().active_id
    }

    /// Latest accepted snapshot of the selected chat.
    pub fn active(&self) -> Option<ChatSession> {
        self.lock().active.clone()
    }

    /// Chat list as last refreshed.
    pub fn chats(&self) -> Vec<ChatSummary> {
        self.lock().chats.clone()
    }

    /// Registers a callback run after every accepted update.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&ChatSession) + Send + Sync + 'static,
    {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed) + 1;
        self.observers().push((id, Arc::new(callback)));
        id
    }

    /// Removes an observer; returns false if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    /// Runs every observer with `session`.
    ///
    /// Must be called without the state lock held so observers may read the
    /// store.
    pub(crate) fn publish(&self, session: &ChatSession) {
        let observers: Vec<Observer> = self
            .observers()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(session);
        }
    }
}
