//! Message history of a single room

use crate::models::{MessageRecord, ParticipantId, RoomKey};

/// Shown when the other participant has not written yet.
pub const UNKNOWN_RECIPIENT: &str = "Unknown User";

/// Messages of one room, oldest first. Stable for full ties.
pub fn transcript(messages: &[MessageRecord], room_key: &RoomKey) -> Vec<MessageRecord> {
    let mut room: Vec<MessageRecord> = messages
        .iter()
        .filter(|m| &m.room_key == room_key)
        .cloned()
        .collect();
    room.sort_by_key(MessageRecord::order_key);
    room
}

/// Name to show for the other side: the first message not sent by `viewer`.
pub fn recipient_name<'m>(transcript: &'m [MessageRecord], viewer: &ParticipantId) -> &'m str {
    transcript
        .iter()
        .find(|m| &m.sender_id != viewer)
        .map(|m| m.sender_display_name.as_str())
        .unwrap_or(UNKNOWN_RECIPIENT)
}
