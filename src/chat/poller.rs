//! Queue position poller
//!
//! [`QueuePoller`] keeps refreshing chats whose reply is still queued on the
//! backend until their queue position reaches 0. Each polled chat owns
//! exactly one [`PollHandle`]; the handle map is the single source of truth
//! for "is this chat being polled".
//!
//! # Scheduling
//!
//! A poll loop waits `interval`, fetches the chat, hands the snapshot to the
//! [`PollSink`], and only then waits again. Ticks for one chat never overlap
//! and a slow fetch pushes the next tick back instead of piling up requests.
//!
//! # Cancellation
//!
//! `stop` cancels the handle's token. A loop that is waiting for its next
//! tick exits immediately; a fetch already in flight is not interrupted and
//! its result is still delivered. Discarding results for chats that are no
//! longer selected is the sink's job.

use crate::chat::client::MessageClient;
use crate::chat::session::{ChatId, ChatSession};
use crate::chat::store::RequestStamp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receiver of snapshots fetched by poll ticks
pub trait PollSink: Send + Sync + 'static {
    /// Called right before each tick's fetch is sent. The returned stamp is
    /// handed back to [`deliver`](Self::deliver) with the result so the sink
    /// can order it against other requests for the same chat.
    fn issue(&self, _chat_id: ChatId) -> RequestStamp {
        0
    }

    /// Called once per successful tick with the chat id and stamp the tick
    /// was issued with.
    fn deliver(&self, chat_id: ChatId, stamp: RequestStamp, session: ChatSession);
}

/// Ownership token of one active poll loop
#[derive(Debug)]
struct PollHandle {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct Registry {
    handles: HashMap<ChatId, PollHandle>,
    next_generation: u64,
}

impl Registry {
    /// Removes the handle for `chat_id` only if it is still the one with
    /// `generation`; a loop must never tear down its successor.
    fn release(&mut self, chat_id: ChatId, generation: u64) -> bool {
        match self.handles.get(&chat_id) {
            Some(handle) if handle.generation == generation => {
                if let Some(handle) = self.handles.remove(&chat_id) {
                    handle.token.cancel();
                }
                true
            }
            _ => false,
        }
    }
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    // The registry holds no invariants a panic midway could break.
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

/// Periodic refresher for queued chats
///
/// Dropping the poller stops every loop it started.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use queuechat::chat::fake::{chat_snapshot, FakeMessageClient};
/// use queuechat::chat::{ChatId, ChatSession, PollSink, QueuePoller, RequestStamp};
///
/// struct Print;
///
/// impl PollSink for Print {
///     fn deliver(&self, chat_id: ChatId, _stamp: RequestStamp, session: ChatSession) {
///         println!("{} at {}", chat_id, session.queue_position);
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let fake = Arc::new(FakeMessageClient::new());
/// fake.insert_chat(chat_snapshot(1, 2));
///
/// let poller = QueuePoller::new(fake, Arc::new(Print), Duration::from_secs(5));
/// assert!(poller.start(ChatId(1)));
/// assert!(!poller.start(ChatId(1)));
/// assert!(poller.stop(ChatId(1)));
/// # }
/// ```
pub struct QueuePoller<C: MessageClient> {
    client: Arc<C>,
    sink: Arc<dyn PollSink>,
    interval: Duration,
    registry: SharedRegistry,
}

impl<C: MessageClient> QueuePoller<C> {
    /// Creates a poller that fetches through `client` every `interval` and
    /// hands results to `sink`.
    pub fn new(client: Arc<C>, sink: Arc<dyn PollSink>, interval: Duration) -> Self {
        Self {
            client,
            sink,
            interval,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Delay between the end of one tick and the start of the next.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts polling `chat_id` unless a loop for it is already active.
    ///
    /// Returns true if a new loop was started, false on a no-op.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self, chat_id: ChatId) -> bool {
        let (generation, token) = {
            let mut registry = lock(&self.registry);
            if registry.handles.contains_key(&chat_id) {
                debug!(chat_id = %chat_id, "Poller already active");
                return false;
            }

            registry.next_generation += 1;
            let generation = registry.next_generation;
            let token = CancellationToken::new();
            registry.handles.insert(
                chat_id,
                PollHandle {
                    generation,
                    token: token.clone(),
                },
            );
            (generation, token)
        };

        debug!(
            chat_id = %chat_id,
            generation = generation,
            interval_ms = self.interval.as_millis() as u64,
            "Starting poller"
        );

        let poll_loop = PollLoop {
            chat_id,
            generation,
            token,
            interval: self.interval,
            client: self.client.clone(),
            sink: self.sink.clone(),
            registry: self.registry.clone(),
        };
        tokio::spawn(poll_loop.run());

        true
    }

    /// Stops polling `chat_id`.
    ///
    /// Returns true if a loop was active. Once this returns, no further tick
    /// for the chat is started.
    pub fn stop(&self, chat_id: ChatId) -> bool {
        let handle = lock(&self.registry).handles.remove(&chat_id);
        match handle {
            Some(handle) => {
                handle.token.cancel();
                debug!(chat_id = %chat_id, generation = handle.generation, "Stopped poller");
                true
            }
            None => false,
        }
    }

    /// Stops every active loop.
    pub fn stop_all(&self) {
        let handles: Vec<(ChatId, PollHandle)> = lock(&self.registry).handles.drain().collect();
        if !handles.is_empty() {
            debug!(count = handles.len(), "Stopping all pollers");
        }
        for (_, handle) in handles {
            handle.token.cancel();
        }
    }

    /// Returns true while a loop for `chat_id` is active.
    pub fn is_polling(&self, chat_id: ChatId) -> bool {
        lock(&self.registry).handles.contains_key(&chat_id)
    }

    /// Number of active loops.
    pub fn active_count(&self) -> usize {
        lock(&self.registry).handles.len()
    }
}

impl<C: MessageClient> Drop for QueuePoller<C> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

struct PollLoop<C: MessageClient> {
    chat_id: ChatId,
    generation: u64,
    token: CancellationToken,
    interval: Duration,
    client: Arc<C>,
    sink: Arc<dyn PollSink>,
    registry: SharedRegistry,
}

impl<C: MessageClient> PollLoop<C> {
    async fn run(self) {
        let chat_id = self.chat_id;
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            tick += 1;
            let stamp = self.sink.issue(chat_id);
            match self.client.fetch_chat(chat_id).await {
                Ok(session) => {
                    let position = session.queue_position;
                    debug!(chat_id = %chat_id, tick = tick, queue_position = position, "Poll tick");

                    if position == 0 {
                        lock(&self.registry).release(chat_id, self.generation);
                        info!(chat_id = %chat_id, ticks = tick, "Reply ready, polling stopped");
                    }
                    self.sink.deliver(chat_id, stamp, session);

                    if position == 0 {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        chat_id = %chat_id,
                        tick = tick,
                        error = %e,
                        "Poll tick failed, retrying at next interval"
                    );
                }
            }

            if self.token.is_cancelled() {
                break;
            }
        }

        debug!(chat_id = %chat_id, generation = self.generation, "Poll loop exited");
    }
}
