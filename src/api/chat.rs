//! Product chats: inbox, history, sending, translations and live updates
//!
//! Rooms are found by projecting the whole message log for the signed-in
//! user; nothing tracks membership separately.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use tokio::time;
use tokio_stream::StreamExt;

use super::client::MarketClient;
use crate::models::{ContextId, MessageDraft, MessageRecord, ParticipantId, RoomKey, RoomSummary};
use crate::rooms::{self, Projection};
use crate::store::{MessageStore, RoomFilter, MESSAGES_COLLECTION};

/// Longest message preview shown in the inbox.
const PREVIEW_CHARS: usize = 80;

/// List the signed-in user's chats (prints to stdout).
pub fn list_chats() -> Result<()> {
    let client = MarketClient::new()?;
    let projection = list_chats_data(&client);

    println!("\nChats:");
    println!("{:-<60}", "");
    print_rooms(&projection.rooms);

    if !projection.diagnostics.is_empty() {
        println!(
            "({} problems skipped, run with --verbose for details)",
            projection.diagnostics.len()
        );
    }

    Ok(())
}

/// Read the conversation with another user (prints to stdout).
///
/// With `follow`, keeps printing the room's new messages until Ctrl+C.
pub async fn read_messages(
    with: &str,
    product: Option<&str>,
    limit: usize,
    follow: bool,
) -> Result<()> {
    let mut client = MarketClient::new()?;
    let conversation = read_messages_data(&client, with, product, limit)?;

    println!("Chat with {} ({})", conversation.recipient_name, conversation.room_key);
    if conversation.messages.is_empty() {
        println!("(no messages)");
    }
    for msg in &conversation.messages {
        print_message(&client.user().id, msg);
    }

    if follow {
        follow_room(&mut client, conversation.room_key).await?;
    }
    Ok(())
}

/// Send a message to another user about an optional product.
pub fn send_message(to: &str, product: Option<&str>, message: &str) -> Result<()> {
    let mut client = MarketClient::new()?;
    let record = send_message_with_client(&mut client, to, product, message)?;
    println!("Message sent ({}).", record.id);
    Ok(())
}

/// Attach a translation to a message in one of the user's rooms.
pub fn translate_message(message_id: &str, text: &str) -> Result<()> {
    let mut client = MarketClient::new()?;
    translate_with_client(&mut client, message_id, text)?;
    println!("Translation saved.");
    Ok(())
}

/// Print the inbox, then re-print it whenever one of the user's rooms changes.
///
/// Every update re-projects the full log. Ctrl+C stops watching.
pub async fn watch() -> Result<()> {
    let mut client = MarketClient::new()?;
    let mut feed = client
        .store()
        .subscribe(RoomFilter::Participant(client.user().id.clone()));

    print_rooms(&inbox_rooms(&client));
    println!("\nWatching for new messages (Ctrl+C to stop)...");

    let mut poll = time::interval(client.config().watch_interval());
    poll.tick().await; // skip first immediate tick

    loop {
        tokio::select! {
            _ = poll.tick() => poll_changes(&mut client),
            Some(record) = feed.next() => {
                tracing::debug!("Update in {} (seq {})", record.room_key, record.seq);
                println!(
                    "\n[{}] {} wrote in {}",
                    local_time(&record.created_at),
                    record.sender_display_name,
                    record.room_key
                );
                print_rooms(&inbox_rooms(&client));
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down...");
                return Ok(());
            }
        }
    }
}

/// Print new messages and translations in one room until Ctrl+C.
async fn follow_room(client: &mut MarketClient, room_key: RoomKey) -> Result<()> {
    let mut feed = client.store().subscribe(RoomFilter::Room(room_key));
    println!("\nFollowing (Ctrl+C to stop)...");

    let mut poll = time::interval(client.config().watch_interval());
    poll.tick().await;

    loop {
        tokio::select! {
            _ = poll.tick() => poll_changes(client),
            Some(record) = feed.next() => print_message(&client.user().id, &record),
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn poll_changes(client: &mut MarketClient) {
    match client.refresh() {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Picked up {} changed messages", n),
        Err(e) => tracing::warn!("{:#}", e),
    }
}

// ---------------------------------------------------------------------------
// Data-returning functions
// ---------------------------------------------------------------------------

/// One room's history as seen by the signed-in user.
pub struct Conversation {
    pub room_key: RoomKey,
    pub recipient_name: String,
    pub messages: Vec<MessageRecord>,
}

/// Project every stored message into the signed-in user's rooms.
pub fn list_chats_data(client: &MarketClient) -> Projection {
    let messages = client.store().query_all(MESSAGES_COLLECTION);
    client
        .projector()
        .project_with_diagnostics(&messages, &client.user().id)
}

/// The signed-in user's rooms without diagnostics.
pub fn inbox_rooms(client: &MarketClient) -> Vec<RoomSummary> {
    let messages = client.store().query_all(MESSAGES_COLLECTION);
    client.projector().project(&messages, &client.user().id)
}

/// Room key between the signed-in user and `other`, optionally about `product`.
pub fn room_key_with(client: &MarketClient, other: &str, product: Option<&str>) -> Result<RoomKey> {
    let participants = [client.user().id.clone(), ParticipantId::new(other)];
    let context = product.map(ContextId::new);
    rooms::compute_key(&participants, context.as_ref())
        .with_context(|| format!("Cannot open a chat with '{}'", other))
}

/// Last `limit` messages of the room with `with`, oldest first.
pub fn read_messages_data(
    client: &MarketClient,
    with: &str,
    product: Option<&str>,
    limit: usize,
) -> Result<Conversation> {
    let room_key = room_key_with(client, with, product)?;
    let all = client.store().query_all(MESSAGES_COLLECTION);
    let mut messages = rooms::transcript(&all, &room_key);

    let recipient_name = rooms::recipient_name(&messages, &client.user().id).to_string();

    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }

    Ok(Conversation {
        room_key,
        recipient_name,
        messages,
    })
}

/// Send using an existing client (shared helper).
pub fn send_message_with_client(
    client: &mut MarketClient,
    to: &str,
    product: Option<&str>,
    message: &str,
) -> Result<MessageRecord> {
    if message.trim().is_empty() {
        bail!("Message is empty");
    }

    let room_key = room_key_with(client, to, product)?;
    if let Some(product) = product {
        if client.catalog().get(&ContextId::new(product)).is_none() {
            bail!("Unknown product '{}'. See 'ecomarket-chat products list'.", product);
        }
    }

    let user = client.user();
    let draft = MessageDraft {
        sender_id: user.id.clone(),
        sender_display_name: user.display_name.clone(),
        body: message.to_string(),
        created_at: Utc::now(),
    };

    tracing::debug!("Sending message to {}", room_key);
    let record = client
        .store_mut()
        .append(&room_key, draft)
        .context("Failed to store message")?;
    Ok(record)
}

/// Set the translation of `message_id`, which must be in one of the user's rooms.
pub fn translate_with_client(
    client: &mut MarketClient,
    message_id: &str,
    text: &str,
) -> Result<MessageRecord> {
    if text.trim().is_empty() {
        bail!("Translation is empty");
    }

    let me = client.user().id.clone();
    let message = client
        .store()
        .query_all(MESSAGES_COLLECTION)
        .into_iter()
        .find(|m| m.id == message_id)
        .with_context(|| format!("Message {} not found", message_id))?;

    let member = rooms::parse_key(&message.room_key)
        .map(|parsed| parsed.contains(&me))
        .unwrap_or(false);
    if !member {
        bail!("Message {} is not in one of your chats", message_id);
    }

    let record = client
        .store_mut()
        .set_translation(message_id, text.trim())
        .context("Failed to store translation")?;
    Ok(record)
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_message(me: &ParticipantId, msg: &MessageRecord) {
    let sender = if &msg.sender_id == me {
        "You"
    } else {
        msg.sender_display_name.as_str()
    };
    println!("[{}] {}: {}", local_time(&msg.created_at), sender, msg.body);
    if let Some(ref translated) = msg.translated_body {
        println!("    ({})", translated);
    }
    tracing::debug!("  id={} seq={}", msg.id, msg.seq);
}

fn print_rooms(rooms: &[RoomSummary]) {
    if rooms.is_empty() {
        println!("  (no chats found)");
        return;
    }

    for room in rooms {
        let who = room
            .other_display_name
            .as_deref()
            .unwrap_or(room.other_participant.as_str());
        match room.context_name {
            Some(ref product) => println!("{} about {}", who, product),
            None => println!("{}", who),
        }
        println!("  With: {}", room.other_participant);
        if let Some(ref product) = room.context_id {
            println!("  Product: {}", product);
        }

        let last = &room.last_message;
        println!(
            "  Last: {} ({} messages)",
            local_time(&last.created_at),
            room.message_count
        );
        let text = preview(&last.body);
        if !text.is_empty() {
            println!("  [{}]: {}", last.sender_display_name, text);
        }
        println!();
    }
}

fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Single-line preview, shortened to `PREVIEW_CHARS` characters.
fn preview(body: &str) -> String {
    let text = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    } else {
        text
    }
}
