//! Persistence collaborators: message log, product catalog, name lookup

mod catalog;
mod local;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::pin::Pin;

use fs2::FileExt;
use thiserror::Error;
use tokio_stream::Stream;

use crate::models::{ContextId, MessageDraft, MessageRecord, ParticipantId, RoomKey};
use crate::rooms::{self, ChatError};

pub use catalog::{NewProduct, ProductCatalog, ProductEdit};
pub use local::LocalStore;

/// Collection group every chat message lives in.
pub const MESSAGES_COLLECTION: &str = "messages";

/// Live feed of message writes. Never ends while the store is alive.
pub type MessageStream = Pin<Box<dyn Stream<Item = MessageRecord> + Send>>;

/// Errors raised by a message store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Refusing to write under room key: {0}")]
    InvalidRoom(#[from] ChatError),

    #[error("Message {0} not found")]
    MessageNotFound(String),
}

/// Errors raised while resolving a context id to a display name.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Context {0} not found")]
    NotFound(String),
}

/// Which writes a subscription receives.
#[derive(Debug, Clone)]
pub enum RoomFilter {
    Room(RoomKey),
    /// Every room whose key names this participant.
    Participant(ParticipantId),
}

impl RoomFilter {
    pub fn matches(&self, record: &MessageRecord) -> bool {
        match self {
            RoomFilter::Room(key) => &record.room_key == key,
            RoomFilter::Participant(id) => rooms::parse_key(&record.room_key)
                .map(|parsed| parsed.contains(id))
                .unwrap_or(false),
        }
    }
}

/// Message log backing the chat rooms.
pub trait MessageStore {
    /// Append a message under `room_key`, assigning id and sequence number.
    fn append(&mut self, room_key: &RoomKey, draft: MessageDraft)
        -> Result<MessageRecord, StoreError>;

    /// Push feed of appends (and translation updates) matching `filter`.
    fn subscribe(&self, filter: RoomFilter) -> MessageStream;

    /// One-shot snapshot of every record in the named collection group.
    fn query_all(&self, collection: &str) -> Vec<MessageRecord>;

    /// Attach a translation to an existing message. The only permitted edit.
    fn set_translation(&mut self, message_id: &str, text: &str)
        -> Result<MessageRecord, StoreError>;
}

/// Looks up the display name of a conversation context.
pub trait ContextNameResolver {
    fn resolve(&self, context: &ContextId) -> Result<String, ResolveError>;
}

/// Document path of a message: `chatRooms/{room}/messages/{id}`.
pub fn message_path(room_key: &RoomKey, message_id: &str) -> String {
    format!("chatRooms/{}/{}/{}", room_key, MESSAGES_COLLECTION, message_id)
}

/// Take an exclusive advisory lock on `path`, creating it if needed.
///
/// The lock is released when the returned file is dropped. Writers sharing a
/// data directory hold it across read, modify and write.
pub(crate) fn lock_file(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Collection id a document path belongs to (second to last segment).
pub fn collection_of(path: &str) -> Option<&str> {
    let mut segments = path.rsplit('/');
    segments.next()?;
    segments.next().filter(|s| !s.is_empty())
}
