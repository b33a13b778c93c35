//! Chat controller
//!
//! [`ChatController`] is the single point of mutation for the selected chat.
//! It mediates between user actions (`select_chat`, `send_message`,
//! `create_chat`), backend responses, and the [`QueuePoller`].
//!
//! # Staleness
//!
//! Every asynchronous result carries the chat id it was issued for. When it
//! completes, that id is compared with the chat selected *at completion
//! time*; results for a chat that is no longer selected are dropped without
//! touching state. A dropped result is not an error: the action that issued
//! it simply returns `Ok(None)`.
//!
//! Every fetch and send is also stamped when it is issued. A result whose
//! stamp is older than the last one applied for its chat is dropped the
//! same way, so a poll answered after a later send cannot overwrite the
//! send's snapshot.
//!
//! # Teardown
//!
//! Call [`ChatController::dispose`] when the consuming context goes away.
//! Dropping the controller does the same.

use crate::chat::client::MessageClient;
use crate::chat::poller::{PollSink, QueuePoller};
use crate::chat::session::{ChatId, ChatSession, ChatSummary, CreateChatRequest};
use crate::chat::store::{ObserverId, RequestStamp, SessionStore};
use crate::config::PollingConfig;
use crate::error::QueuechatError;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Action a result was produced by, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateSource {
    Select,
    Send,
    Create,
    Poll,
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Select => "select",
            Self::Send => "send",
            Self::Create => "create",
            Self::Poll => "poll",
        };
        f.write_str(s)
    }
}

struct Inner<C: MessageClient> {
    store: SessionStore,
    poller: QueuePoller<C>,
}

impl<C: MessageClient> Inner<C> {
    /// Makes `chat_id` the selected chat before its snapshot is fetched.
    ///
    /// Switching away from another chat discards its snapshot and stops its
    /// poller. Returns the stamp for the fetch that follows.
    fn begin_selection(&self, chat_id: ChatId) -> RequestStamp {
        let mut state = self.store.lock();
        let stamp = state.issue();
        let previous = state.active_id.replace(chat_id);
        if previous == Some(chat_id) {
            return stamp;
        }

        state.active = None;
        if let Some(previous) = previous {
            self.poller.stop(previous);
            debug!(from = %previous, to = %chat_id, "Switched selected chat");
        }
        stamp
    }

    fn issue(&self) -> RequestStamp {
        self.store.lock().issue()
    }

    /// Applies `session` if `issued_for` is still selected and no newer
    /// request's result was applied, then reconciles polling with its queue
    /// position.
    ///
    /// Poller start/stop happens under the store lock so a concurrent
    /// selection change cannot leave a loop running for a deselected chat.
    fn accept(
        &self,
        issued_for: ChatId,
        stamp: RequestStamp,
        session: ChatSession,
        source: UpdateSource,
    ) -> Option<ChatSession> {
        let accepted = {
            let mut state = self.store.lock();
            if state.active_id != Some(issued_for) {
                debug!(
                    chat_id = %issued_for,
                    active = ?state.active_id,
                    source = %source,
                    "Discarding stale result"
                );
                return None;
            }

            if session.id != issued_for {
                warn!(
                    chat_id = %issued_for,
                    returned = %session.id,
                    source = %source,
                    "Backend returned a different chat, ignoring"
                );
                return None;
            }

            if !state.claim(issued_for, stamp) {
                debug!(
                    chat_id = %issued_for,
                    stamp,
                    source = %source,
                    "Discarding outdated result"
                );
                // A poll loop that saw position 0 has already released itself.
                match state.active.as_ref() {
                    Some(current) if current.in_queue() => {
                        self.poller.start(issued_for);
                    }
                    Some(_) => {
                        self.poller.stop(issued_for);
                    }
                    None => {}
                }
                return None;
            }

            if !session.has_consistent_queue_state() {
                warn!(
                    chat_id = %issued_for,
                    queue_position = session.queue_position,
                    "Queued chat does not end with a user message"
                );
            }

            if session.in_queue() {
                self.poller.start(issued_for);
            } else {
                self.poller.stop(issued_for);
            }

            if let Some(summary) = state.chats.iter_mut().find(|c| c.id == issued_for) {
                summary.title = session.title.clone();
                summary.updated_at = session.updated_at;
            }

            state.active = Some(session.clone());
            session
        };

        debug!(
            chat_id = %issued_for,
            queue_position = accepted.queue_position,
            source = %source,
            "Applied chat update"
        );
        self.store.publish(&accepted);
        Some(accepted)
    }

    fn clear(&self) {
        let mut state = self.store.lock();
        state.active_id = None;
        state.active = None;
        self.poller.stop_all();
    }
}

/// Routes poll results back through the controller's staleness guard.
struct ControllerSink<C: MessageClient> {
    inner: Weak<Inner<C>>,
}

impl<C: MessageClient> PollSink for ControllerSink<C> {
    fn issue(&self, _chat_id: ChatId) -> RequestStamp {
        self.inner.upgrade().map_or(0, |inner| inner.issue())
    }

    fn deliver(&self, chat_id: ChatId, stamp: RequestStamp, session: ChatSession) {
        if let Some(inner) = self.inner.upgrade() {
            inner.accept(chat_id, stamp, session, UpdateSource::Poll);
        }
    }
}

/// Orchestrates the selected chat, message sends, and queue polling
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use queuechat::chat::fake::{chat_snapshot, FakeMessageClient};
/// use queuechat::chat::{ChatController, ChatId};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), queuechat::QueuechatError> {
/// let fake = Arc::new(FakeMessageClient::new());
/// fake.insert_chat(chat_snapshot(1, 0));
///
/// let controller = ChatController::new(fake, Duration::from_secs(5));
/// controller.on_chat_updated(|chat| println!("queue position {}", chat.queue_position));
///
/// controller.select_chat(ChatId(1)).await?;
/// controller.send_message("hello").await?;
/// assert!(controller.is_polling(ChatId(1)));
///
/// controller.dispose();
/// assert!(!controller.is_polling(ChatId(1)));
/// # Ok(())
/// # }
/// ```
pub struct ChatController<C: MessageClient> {
    client: Arc<C>,
    inner: Arc<Inner<C>>,
}

impl<C: MessageClient> ChatController<C> {
    /// Creates a controller polling queued chats every `interval`.
    pub fn new(client: Arc<C>, interval: Duration) -> Self {
        let poll_client = client.clone();
        let inner = Arc::new_cyclic(|weak: &Weak<Inner<C>>| {
            let sink = Arc::new(ControllerSink {
                inner: weak.clone(),
            });
            Inner {
                store: SessionStore::new(),
                poller: QueuePoller::new(poll_client, sink, interval),
            }
        });

        Self { client, inner }
    }

    /// Creates a controller from the polling section of the configuration.
    pub fn from_config(client: Arc<C>, config: &PollingConfig) -> Self {
        Self::new(client, config.interval())
    }

    /// Selects `chat_id`, fetches it, and starts or stops polling to match
    /// its queue position.
    ///
    /// Polling for the previously selected chat stops as soon as the
    /// selection changes, whether or not the fetch succeeds.
    ///
    /// # Returns
    ///
    /// `Ok(Some(session))` if the snapshot was applied, `Ok(None)` if another
    /// chat was selected while the fetch was in flight.
    ///
    /// # Errors
    ///
    /// Returns `QueuechatError::Client` if the fetch fails. The new selection
    /// stays in place without a snapshot.
    pub async fn select_chat(
        &self,
        chat_id: ChatId,
    ) -> Result<Option<ChatSession>, QueuechatError> {
        info!(chat_id = %chat_id, "Selecting chat");
        let stamp = self.inner.begin_selection(chat_id);

        let session = self.client.fetch_chat(chat_id).await.map_err(|e| {
            warn!(chat_id = %chat_id, error = %e, "Failed to fetch chat");
            QueuechatError::from(e)
        })?;

        Ok(self.inner.accept(chat_id, stamp, session, UpdateSource::Select))
    }

    /// Sends `content` to the selected chat.
    ///
    /// If the backend queues the reply, polling starts for the chat. Sending
    /// while a poll is in flight is allowed; the poller never runs two loops
    /// for one chat.
    ///
    /// # Returns
    ///
    /// `Ok(Some(session))` if the response was applied, `Ok(None)` if the
    /// selection changed before it arrived.
    ///
    /// # Errors
    ///
    /// - `QueuechatError::NoActiveChat` if nothing is selected; no request is made
    /// - `QueuechatError::EmptyMessage` if `content` is blank
    /// - `QueuechatError::Client` if the send fails; state is left as it was
    ///   before the call
    pub async fn send_message(
        &self,
        content: &str,
    ) -> Result<Option<ChatSession>, QueuechatError> {
        let chat_id = self
            .inner
            .store
            .active_id()
            .ok_or(QueuechatError::NoActiveChat)?;

        if content.trim().is_empty() {
            return Err(QueuechatError::EmptyMessage);
        }

        info!(chat_id = %chat_id, length = content.len(), "Sending message");
        let stamp = self.inner.issue();
        let session = self
            .client
            .send_message(chat_id, content)
            .await
            .map_err(|e| {
                warn!(chat_id = %chat_id, error = %e, "Failed to send message");
                QueuechatError::from(e)
            })?;

        if session.in_queue() {
            info!(
                chat_id = %chat_id,
                queue_position = session.queue_position,
                "Reply queued"
            );
        }

        Ok(self.inner.accept(chat_id, stamp, session, UpdateSource::Send))
    }

    /// Creates a chat, selects it, and refreshes the chat list.
    ///
    /// A failed list refresh is logged; the created chat is still returned.
    ///
    /// # Errors
    ///
    /// Returns `QueuechatError::InvalidRequest` if `request` fails validation
    /// and `QueuechatError::Client` if creation fails.
    pub async fn create_chat(
        &self,
        request: &CreateChatRequest,
    ) -> Result<ChatSession, QueuechatError> {
        request.validate()?;

        let session = self.client.create_chat(request).await?;
        let chat_id = session.id;
        info!(chat_id = %chat_id, title = %session.title, "Chat created");

        let stamp = self.inner.begin_selection(chat_id);
        let session = self
            .inner
            .accept(chat_id, stamp, session.clone(), UpdateSource::Create)
            .unwrap_or(session);

        if let Err(e) = self.refresh_chats().await {
            warn!(error = %e, "Failed to refresh chat list after create");
        }

        Ok(session)
    }

    /// Reloads the chat list into the store.
    pub async fn refresh_chats(&self) -> Result<Vec<ChatSummary>, QueuechatError> {
        let chats = self.client.list_chats().await?;
        debug!(count = chats.len(), "Refreshed chat list");
        self.inner.store.lock().chats = chats.clone();
        Ok(chats)
    }

    /// Stops all polling and clears the selection.
    ///
    /// Results still in flight are discarded when they arrive. Safe to call
    /// more than once.
    pub fn dispose(&self) {
        debug!("Disposing chat controller");
        self.inner.clear();
    }

    /// Registers a callback run synchronously after every accepted update.
    pub fn on_chat_updated<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&ChatSession) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(callback)
    }

    /// Removes a callback registered with [`on_chat_updated`](Self::on_chat_updated).
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    /// Latest accepted snapshot of the selected chat.
    pub fn active_chat(&self) -> Option<ChatSession> {
        self.inner.store.active()
    }

    /// Currently selected chat id.
    pub fn active_chat_id(&self) -> Option<ChatId> {
        self.inner.store.active_id()
    }

    /// Chat list as last refreshed.
    pub fn chats(&self) -> Vec<ChatSummary> {
        self.inner.store.chats()
    }

    /// Returns true while `chat_id` is being polled.
    pub fn is_polling(&self, chat_id: ChatId) -> bool {
        self.inner.poller.is_polling(chat_id)
    }

    /// Number of chats being polled.
    pub fn active_poll_count(&self) -> usize {
        self.inner.poller.active_count()
    }
}

impl<C: MessageClient> Drop for ChatController<C> {
    fn drop(&mut self) {
        self.inner.clear();
    }
}
