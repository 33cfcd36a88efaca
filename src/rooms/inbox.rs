//! Inbox projection
//!
//! Rebuilds the list of rooms one user takes part in from a flat snapshot of
//! every message in the store. The work is O(total messages) on each call;
//! nothing is cached between calls.

use std::collections::{BTreeMap, HashMap};

use crate::models::{ContextId, MessageRecord, ParticipantId, RoomKey, RoomSummary};
use crate::store::ContextNameResolver;

use super::{parse_key, ChatError};

/// Shown instead of a product name that could not be resolved.
pub const PLACEHOLDER_CONTEXT_NAME: &str = "Unknown product";

/// Result of a projection together with the problems it stepped around.
#[derive(Debug, Default)]
pub struct Projection {
    pub rooms: Vec<RoomSummary>,
    /// Skipped records, dropped rooms and failed lookups, in encounter order.
    pub diagnostics: Vec<ChatError>,
}

/// Projects message snapshots into per-viewer room summaries.
pub struct InboxProjector<'r> {
    resolver: &'r dyn ContextNameResolver,
    placeholder: String,
}

impl<'r> InboxProjector<'r> {
    pub fn new(resolver: &'r dyn ContextNameResolver) -> Self {
        Self {
            resolver,
            placeholder: PLACEHOLDER_CONTEXT_NAME.to_string(),
        }
    }

    /// Replace the name shown for contexts that fail to resolve.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Rooms visible to `viewer`, most recently active first.
    pub fn project(&self, messages: &[MessageRecord], viewer: &ParticipantId) -> Vec<RoomSummary> {
        self.project_with_diagnostics(messages, viewer).rooms
    }

    /// Like [`project`](Self::project), also returning what was skipped.
    pub fn project_with_diagnostics(
        &self,
        messages: &[MessageRecord],
        viewer: &ParticipantId,
    ) -> Projection {
        let mut groups: BTreeMap<&RoomKey, Vec<&MessageRecord>> = BTreeMap::new();
        for msg in messages {
            groups.entry(&msg.room_key).or_default().push(msg);
        }

        let mut projection = Projection::default();
        let mut names: HashMap<ContextId, String> = HashMap::new();

        for (key, records) in groups {
            let parsed = match parse_key(key) {
                Ok(parsed) => parsed,
                Err(e) => {
                    for record in &records {
                        let diag = ChatError::MessageParseFailed {
                            message_id: record.id.clone(),
                            reason: e.to_string(),
                        };
                        tracing::warn!("{}", diag);
                        projection.diagnostics.push(diag);
                    }
                    continue;
                }
            };

            // Exact membership on the parsed pair, never substring search.
            if !parsed.contains(viewer) {
                continue;
            }

            let Some(other) = parsed.other(viewer).cloned() else {
                let diag = ChatError::DegenerateRoom {
                    key: key.to_string(),
                };
                tracing::debug!("{}", diag);
                projection.diagnostics.push(diag);
                continue;
            };

            let Some(last_message) = latest(records.iter().copied()) else {
                continue;
            };

            let other_display_name =
                latest(records.iter().copied().filter(|m| m.sender_id == other))
                    .map(|m| m.sender_display_name.clone());

            let context_name = parsed.context.as_ref().map(|context| {
                names
                    .entry(context.clone())
                    .or_insert_with(|| self.resolve_name(context, &mut projection.diagnostics))
                    .clone()
            });

            projection.rooms.push(RoomSummary {
                room_key: key.clone(),
                participants: parsed.participants,
                other_participant: other,
                other_display_name,
                context_id: parsed.context,
                context_name,
                last_message: last_message.clone(),
                message_count: records.len(),
            });
        }

        projection.rooms.sort_by(|a, b| {
            b.last_message
                .order_key()
                .cmp(&a.last_message.order_key())
                .then_with(|| a.room_key.cmp(&b.room_key))
        });

        tracing::debug!(
            "Projected {} rooms for {} from {} messages ({} diagnostics)",
            projection.rooms.len(),
            viewer,
            messages.len(),
            projection.diagnostics.len()
        );

        projection
    }

    fn resolve_name(&self, context: &ContextId, diagnostics: &mut Vec<ChatError>) -> String {
        match self.resolver.resolve(context) {
            Ok(name) => name,
            Err(e) => {
                let diag = ChatError::ContextLookupFailed {
                    context: context.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", diag);
                diagnostics.push(diag);
                self.placeholder.clone()
            }
        }
    }
}

/// Newest record by `(created_at, seq)`. On a full tie the later one in
/// iteration order wins.
fn latest<'m>(records: impl Iterator<Item = &'m MessageRecord>) -> Option<&'m MessageRecord> {
    records.reduce(|best, m| if m.order_key() >= best.order_key() { m } else { best })
}
