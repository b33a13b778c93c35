use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use queuechat::chat::fake::FakeMessageClient;
use queuechat::chat::{ChatController, ChatId, ChatSession};
use tempfile::TempDir;

pub const INTERVAL: Duration = Duration::from_secs(5);

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Controller over a fresh fake, with every observed update recorded.
#[allow(dead_code)]
pub fn controller_with_log() -> (
    Arc<FakeMessageClient>,
    ChatController<FakeMessageClient>,
    Arc<Mutex<Vec<ChatSession>>>,
) {
    let fake = Arc::new(FakeMessageClient::new());
    let controller = ChatController::new(fake.clone(), INTERVAL);
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    controller.on_chat_updated(move |chat| sink.lock().unwrap().push(chat.clone()));
    (fake, controller, log)
}

/// Advances paused time by `secs` and lets spawned tasks run.
#[allow(dead_code)]
pub async fn advance_secs(secs: u64) {
    tokio::time::advance(Duration::from_secs(secs)).await;
    settle().await;
}

/// Yields until woken tasks have had a chance to run.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[allow(dead_code)]
pub fn positions(log: &Mutex<Vec<ChatSession>>, chat_id: ChatId) -> Vec<u32> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| c.id == chat_id)
        .map(|c| c.queue_position)
        .collect()
}
