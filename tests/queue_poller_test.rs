//! Queue poller behavior under paused Tokio time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use queuechat::chat::fake::{chat_snapshot, network_error, FakeMessageClient};
use queuechat::chat::{ChatId, ChatSession, PollSink, QueuePoller, RequestStamp};

const INTERVAL: Duration = Duration::from_secs(5);

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<(ChatId, u32)>>,
}

impl RecordingSink {
    fn positions(&self, chat_id: ChatId) -> Vec<u32> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, qp)| *qp)
            .collect()
    }
}

impl PollSink for RecordingSink {
    fn deliver(&self, chat_id: ChatId, _stamp: RequestStamp, session: ChatSession) {
        self.seen
            .lock()
            .unwrap()
            .push((chat_id, session.queue_position));
    }
}

fn setup() -> (
    Arc<FakeMessageClient>,
    Arc<RecordingSink>,
    QueuePoller<FakeMessageClient>,
) {
    let fake = Arc::new(FakeMessageClient::new());
    let sink = Arc::new(RecordingSink::default());
    let poller = QueuePoller::new(fake.clone(), sink.clone(), INTERVAL);
    (fake, sink, poller)
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_at_most_one_handle_per_chat_across_start_stop_sequences() {
    let (fake, _sink, poller) = setup();
    for id in 1..=3 {
        fake.insert_chat(chat_snapshot(id, 4));
    }

    let ops: &[(bool, u64)] = &[
        (true, 1),
        (true, 1),
        (true, 2),
        (false, 1),
        (true, 1),
        (true, 3),
        (false, 2),
        (true, 2),
        (true, 2),
        (false, 3),
        (false, 3),
        (true, 3),
    ];

    let mut expected: HashSet<ChatId> = HashSet::new();
    for &(start, id) in ops {
        let chat_id = ChatId(id);
        if start {
            assert_eq!(poller.start(chat_id), expected.insert(chat_id));
        } else {
            assert_eq!(poller.stop(chat_id), expected.remove(&chat_id));
        }
        assert_eq!(poller.active_count(), expected.len());
        for other in 1..=3 {
            assert_eq!(
                poller.is_polling(ChatId(other)),
                expected.contains(&ChatId(other))
            );
        }
    }

    // Restarted chats must tick once per interval, not once per start.
    sleep_ms(5_500).await;
    for id in 1..=3 {
        assert_eq!(fake.fetch_count(ChatId(id)), 1, "chat {}", id);
    }
}

#[tokio::test(start_paused = true)]
async fn test_double_start_runs_a_single_loop() {
    let (fake, sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 2));

    assert!(poller.start(ChatId(1)));
    assert!(!poller.start(ChatId(1)));
    assert_eq!(poller.active_count(), 1);

    sleep_ms(5_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);

    sleep_ms(5_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 2);
    assert_eq!(sink.positions(ChatId(1)), vec![2, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_polls_until_queue_position_reaches_zero() {
    let (fake, sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 3));
    fake.script_fetch(ChatId(1), Ok(chat_snapshot(1, 2)));
    fake.script_fetch(ChatId(1), Ok(chat_snapshot(1, 1)));
    fake.script_fetch(ChatId(1), Ok(chat_snapshot(1, 0)));

    poller.start(ChatId(1));
    sleep_ms(15_500).await;

    assert_eq!(fake.fetch_count(ChatId(1)), 3);
    assert_eq!(sink.positions(ChatId(1)), vec![2, 1, 0]);
    assert!(!poller.is_polling(ChatId(1)));

    sleep_ms(60_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_keeps_polling_at_normal_interval() {
    let (fake, sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 1));
    fake.script_fetch(ChatId(1), Err(network_error()));
    fake.script_fetch(ChatId(1), Ok(chat_snapshot(1, 0)));

    poller.start(ChatId(1));

    sleep_ms(5_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);
    assert!(poller.is_polling(ChatId(1)));
    assert!(sink.positions(ChatId(1)).is_empty());

    // Next tick lands one interval after the failure, not sooner.
    sleep_ms(4_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);

    sleep_ms(1_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 2);
    assert_eq!(sink.positions(ChatId(1)), vec![0]);
    assert!(!poller.is_polling(ChatId(1)));
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_delays_next_tick() {
    let (fake, _sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 2));
    let gate = fake.hold_fetches(ChatId(1));

    poller.start(ChatId(1));
    sleep_ms(5_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);

    // The first fetch is still held, so no second tick may start.
    sleep_ms(20_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);

    gate.open();
    sleep_ms(5_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 2);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_result_is_delivered_after_stop() {
    let (fake, sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 2));
    let gate = fake.hold_fetches(ChatId(1));

    poller.start(ChatId(1));
    sleep_ms(5_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);

    assert!(poller.stop(ChatId(1)));
    gate.open();
    sleep_ms(100).await;

    assert_eq!(sink.positions(ChatId(1)), vec![2]);
    sleep_ms(30_000).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chats_poll_independently() {
    let (fake, _sink, poller) = setup();
    fake.insert_chat(chat_snapshot(1, 2));
    fake.insert_chat(chat_snapshot(2, 2));

    poller.start(ChatId(1));
    sleep_ms(2_000).await;
    poller.start(ChatId(2));

    sleep_ms(3_500).await;
    assert_eq!(fake.fetch_count(ChatId(1)), 1);
    assert_eq!(fake.fetch_count(ChatId(2)), 0);

    poller.stop(ChatId(1));
    sleep_ms(2_000).await;
    assert_eq!(fake.fetch_count(ChatId(2)), 1);
    assert!(poller.is_polling(ChatId(2)));

    poller.stop_all();
    assert_eq!(poller.active_count(), 0);
}
