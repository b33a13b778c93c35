//! Chat listing, inspection, and creation commands

use super::{build_client, print_json, print_message, queue_status};
use crate::chat::{ChatController, ChatId, ChatSession, ChatSummary, CreateChatRequest};
use crate::cli::CreateArgs;
use crate::config::Config;
use crate::error::Result;
use prettytable::{cell, row, Table};

/// List the caller's chats as a table or JSON.
pub async fn list_chats(config: &Config, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let chats = client.list_chats().await?;
    tracing::debug!(count = chats.len(), "Fetched chat list");

    if json {
        return print_json(&chats);
    }

    if chats.is_empty() {
        println!("No chats yet. Create one with `queuechat create --title <TITLE>`.");
        return Ok(());
    }

    output_chats_table(&chats);
    Ok(())
}

/// Show a single chat with its messages and queue status.
pub async fn show_chat(config: &Config, chat_id: ChatId, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let session = client.fetch_chat(chat_id).await?;

    if json {
        return print_json(&session);
    }

    output_chat(&session);
    Ok(())
}

/// Create a chat and print it.
pub async fn create_chat(config: &Config, args: CreateArgs) -> Result<()> {
    let request = build_request(args);
    let client = build_client(config)?;
    let controller = ChatController::from_config(client, &config.polling);

    let session = controller.create_chat(&request).await;
    controller.dispose();
    let session = session?;

    println!("Created chat {} ({})", session.id, session.title);
    Ok(())
}

fn build_request(args: CreateArgs) -> CreateChatRequest {
    CreateChatRequest {
        initial_context: args.context,
        progression_type: args.progression,
        difficulty: args.difficulty,
        politeness: args.politeness,
        friendliness: args.friendliness,
        rigidity: args.rigidity,
        detail_orientation: args.detail_orientation,
        pacing: args.pacing,
        language: args.language,
        ..CreateChatRequest::new(args.title)
    }
}

fn output_chats_table(chats: &[ChatSummary]) {
    let mut table = Table::new();
    table.add_row(row!["ID", "Title", "Updated"]);

    for chat in chats {
        table.add_row(row![
            chat.id,
            chat.title,
            chat.updated_at.format("%Y-%m-%d %H:%M")
        ]);
    }

    println!();
    table.printstd();
    println!();
}

fn output_chat(session: &ChatSession) {
    println!("\nChat {}: {}", session.id, session.title);
    println!("Status:  {}", queue_status(session));
    println!("Updated: {}\n", session.updated_at.format("%Y-%m-%d %H:%M:%S"));

    for message in &session.messages {
        print_message(message.role, &message.content);
    }
    println!();
}
