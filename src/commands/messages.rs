//! Sending messages and following the reply queue

use super::{build_client, print_message, queue_status};
use crate::chat::{ChatController, ChatId, ChatSession, MessageClient};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use std::future::Future;
use tokio::sync::mpsc;

/// How a follow ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FollowOutcome {
    /// The reply arrived
    Answered(ChatSession),
    /// The caller interrupted before the reply arrived
    Interrupted,
}

/// Send `message` to `chat_id` and, unless `no_wait` is set, wait for the reply.
pub async fn send(config: &Config, chat_id: ChatId, message: String, no_wait: bool) -> Result<()> {
    let client = build_client(config)?;
    let controller = ChatController::from_config(client, &config.polling);

    let result = send_and_follow(&controller, chat_id, &message, no_wait, ctrl_c()).await;
    controller.dispose();
    report(result?);
    Ok(())
}

/// Follow `chat_id` until its queued reply is ready.
pub async fn watch(config: &Config, chat_id: ChatId) -> Result<()> {
    let client = build_client(config)?;
    let controller = ChatController::from_config(client, &config.polling);

    let result = select_and_follow(&controller, chat_id, ctrl_c()).await;
    controller.dispose();
    report(result?);
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn report(outcome: FollowOutcome) {
    match outcome {
        FollowOutcome::Answered(session) if session.in_queue() => {
            println!("Reply for chat {} is {}", session.id, queue_status(&session));
        }
        FollowOutcome::Answered(session) => match session.last_reply() {
            Some(reply) => print_message(reply.role, &reply.content),
            None => println!("Chat {} has no reply yet", session.id),
        },
        FollowOutcome::Interrupted => {
            println!("{}", "Stopped waiting; the reply stays queued.".yellow());
        }
    }
}

pub(crate) async fn send_and_follow<C, F>(
    controller: &ChatController<C>,
    chat_id: ChatId,
    message: &str,
    no_wait: bool,
    shutdown: F,
) -> Result<FollowOutcome>
where
    C: MessageClient,
    F: Future<Output = ()>,
{
    let updates = subscribe(controller);
    controller.select_chat(chat_id).await?;

    let session = controller
        .send_message(message)
        .await?
        .ok_or_else(|| anyhow::anyhow!("chat {} was deselected during send", chat_id))?;
    println!("Message sent to chat {} ({})", chat_id, queue_status(&session));

    if no_wait || !session.in_queue() {
        return Ok(FollowOutcome::Answered(session));
    }

    follow(controller, updates, shutdown).await
}

pub(crate) async fn select_and_follow<C, F>(
    controller: &ChatController<C>,
    chat_id: ChatId,
    shutdown: F,
) -> Result<FollowOutcome>
where
    C: MessageClient,
    F: Future<Output = ()>,
{
    let updates = subscribe(controller);
    let session = controller
        .select_chat(chat_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("chat {} was deselected during fetch", chat_id))?;

    if !session.in_queue() {
        return Ok(FollowOutcome::Answered(session));
    }

    println!("Chat {} is {}", chat_id, queue_status(&session));
    follow(controller, updates, shutdown).await
}

fn subscribe<C: MessageClient>(
    controller: &ChatController<C>,
) -> mpsc::UnboundedReceiver<ChatSession> {
    let (tx, rx) = mpsc::unbounded_channel();
    controller.on_chat_updated(move |session| {
        let _ = tx.send(session.clone());
    });
    rx
}

async fn follow<C, F>(
    controller: &ChatController<C>,
    mut updates: mpsc::UnboundedReceiver<ChatSession>,
    shutdown: F,
) -> Result<FollowOutcome>
where
    C: MessageClient,
    F: Future<Output = ()>,
{
    // Updates published before this point are already reflected in the store.
    while updates.try_recv().is_ok() {}
    let current = controller
        .active_chat()
        .ok_or_else(|| anyhow::anyhow!("no chat is selected"))?;
    if !current.in_queue() {
        return Ok(FollowOutcome::Answered(current));
    }

    tokio::pin!(shutdown);
    let mut last_position = Some(current.queue_position);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(FollowOutcome::Interrupted),
            update = updates.recv() => {
                let Some(session) = update else {
                    anyhow::bail!("chat controller closed while waiting for a reply");
                };
                if !session.in_queue() {
                    return Ok(FollowOutcome::Answered(session));
                }
                if last_position != Some(session.queue_position) {
                    println!("  {}", queue_status(&session));
                    last_position = Some(session.queue_position);
                }
            }
        }
    }
}
