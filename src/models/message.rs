//! Message-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParticipantId, RoomKey};

/// One chat message as stored under its room.
///
/// Records are append-only. The single permitted update after insertion is
/// filling in `translated_body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub room_key: RoomKey,
    pub sender_id: ParticipantId,
    pub sender_display_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Store-assigned, strictly increasing. Breaks `created_at` ties.
    #[serde(default)]
    pub seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_body: Option<String>,
}

impl MessageRecord {
    /// Ordering key within a room: timestamp first, then write sequence.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}

/// A message about to be written. The store fills in id, room and sequence.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender_id: ParticipantId,
    pub sender_display_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
