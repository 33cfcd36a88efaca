//! Room-related models

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ContextId, MessageRecord, ParticipantId};

/// Canonical identity of a room. Built by `rooms::compute_key`.
///
/// The inner string is not validated on deserialization; records read back
/// from storage go through `rooms::parse_key` before they are trusted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    pub(crate) fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Components recovered from a room key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoom {
    /// Sorted byte-wise, not in the order the key was requested.
    pub participants: [ParticipantId; 2],
    pub context: Option<ContextId>,
}

impl ParsedRoom {
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.iter().any(|p| p == participant)
    }

    /// The participant that is not `viewer`, if there is one.
    pub fn other(&self, viewer: &ParticipantId) -> Option<&ParticipantId> {
        self.participants.iter().find(|p| *p != viewer)
    }
}

/// Inbox row for one room as seen by one viewer. Derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub room_key: RoomKey,
    pub participants: [ParticipantId; 2],
    pub other_participant: ParticipantId,
    /// Latest display name the other participant sent under, if they have
    /// written in this room at all.
    pub other_display_name: Option<String>,
    pub context_id: Option<ContextId>,
    /// Resolved product name, or the placeholder when the lookup failed.
    pub context_name: Option<String>,
    pub last_message: MessageRecord,
    pub message_count: usize,
}
