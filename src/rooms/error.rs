//! Error taxonomy for room keys and inbox projection

use thiserror::Error;

/// Room identity and projection errors.
///
/// Key derivation surfaces these to the caller. The projector never fails as
/// a whole: it records the variants it hit as diagnostics and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },

    #[error("A room needs two distinct participants, got {found}")]
    InsufficientParticipants { found: usize },

    #[error("Only two-party rooms are supported, got {found} participants")]
    TooManyParticipants { found: usize },

    #[error("Malformed room key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Room {key} has no participant other than the viewer")]
    DegenerateRoom { key: String },

    #[error("Could not resolve context {context}: {reason}")]
    ContextLookupFailed { context: String, reason: String },

    #[error("Skipped message {message_id}: {reason}")]
    MessageParseFailed { message_id: String, reason: String },
}
