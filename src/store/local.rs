//! File-backed message log
//!
//! One JSON document per line in `messages.jsonl`, each carrying its document
//! path and the record. Several processes may share the file. Writers hold
//! `messages.jsonl.lock` while they re-read the log, assign a sequence number
//! and write, so sequence numbers stay unique and a rewrite never drops
//! another writer's line. `refresh` publishes whatever other writers added.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::models::{MessageDraft, MessageRecord, RoomKey};
use crate::rooms;

use super::{
    collection_of, lock_file, message_path, MessageStore, MessageStream, RoomFilter, StoreError,
};

const LOG_FILE: &str = "messages.jsonl";
const LOCK_FILE: &str = "messages.jsonl.lock";

/// Buffered pushes per subscriber before it starts lagging.
const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    path: String,
    record: MessageRecord,
}

/// Message store persisted under a local data directory.
pub struct LocalStore {
    path: PathBuf,
    lock_path: PathBuf,
    docs: Vec<StoredMessage>,
    /// Message id -> index into `docs`.
    index: HashMap<String, usize>,
    next_seq: u64,
    feed: broadcast::Sender<MessageRecord>,
}

impl LocalStore {
    /// Open (or create) the log inside `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);

        let mut store = Self {
            path: data_dir.join(LOG_FILE),
            lock_path: data_dir.join(LOCK_FILE),
            docs: Vec::new(),
            index: HashMap::new(),
            next_seq: 1,
            feed,
        };
        store.refresh()?;

        tracing::debug!(
            "Opened message log {} ({} messages)",
            store.path.display(),
            store.docs.len()
        );
        Ok(store)
    }

    /// Re-read the log and publish records that are new or changed since the
    /// last read. Returns how many were published.
    pub fn refresh(&mut self) -> Result<usize, StoreError> {
        let mut published = 0;

        for doc in read_log(&self.path)? {
            self.next_seq = self.next_seq.max(doc.record.seq.saturating_add(1));

            let known = self.index.get(&doc.record.id).copied();
            match known {
                Some(i) if self.docs[i].record == doc.record => continue,
                Some(i) => self.docs[i] = doc.clone(),
                None => {
                    self.index.insert(doc.record.id.clone(), self.docs.len());
                    self.docs.push(doc.clone());
                }
            }

            // No subscribers is not an error.
            let _ = self.feed.send(doc.record);
            published += 1;
        }

        Ok(published)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    fn write_all(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("jsonl.tmp");
        let mut content = String::new();
        for doc in &self.docs {
            content.push_str(&serde_json::to_string(doc)?);
            content.push('\n');
        }
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MessageStore for LocalStore {
    fn append(
        &mut self,
        room_key: &RoomKey,
        draft: MessageDraft,
    ) -> Result<MessageRecord, StoreError> {
        rooms::parse_key(room_key)?;
        let _lock = lock_file(&self.lock_path)?;
        self.refresh()?;

        let id = uuid::Uuid::new_v4().to_string();
        let record = MessageRecord {
            id: id.clone(),
            room_key: room_key.clone(),
            sender_id: draft.sender_id,
            sender_display_name: draft.sender_display_name,
            body: draft.body,
            created_at: draft.created_at,
            seq: self.next_seq,
            translated_body: None,
        };
        let doc = StoredMessage {
            path: message_path(room_key, &id),
            record: record.clone(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&doc)?)?;

        self.next_seq = self.next_seq.saturating_add(1);
        self.index.insert(id, self.docs.len());
        self.docs.push(doc);
        let _ = self.feed.send(record.clone());

        tracing::debug!("Appended message {} to {}", record.id, room_key);
        Ok(record)
    }

    fn subscribe(&self, filter: RoomFilter) -> MessageStream {
        let stream = BroadcastStream::new(self.feed.subscribe()).filter_map(move |item| match item {
            Ok(record) if filter.matches(&record) => Some(record),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Subscriber lagged, {} updates dropped", skipped);
                None
            }
        });
        Box::pin(stream)
    }

    fn query_all(&self, collection: &str) -> Vec<MessageRecord> {
        self.docs
            .iter()
            .filter(|doc| collection_of(&doc.path) == Some(collection))
            .map(|doc| doc.record.clone())
            .collect()
    }

    fn set_translation(
        &mut self,
        message_id: &str,
        text: &str,
    ) -> Result<MessageRecord, StoreError> {
        let _lock = lock_file(&self.lock_path)?;
        self.refresh()?;

        let i = *self
            .index
            .get(message_id)
            .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))?;
        self.docs[i].record.translated_body = Some(text.to_string());
        self.write_all()?;

        let record = self.docs[i].record.clone();
        let _ = self.feed.send(record.clone());
        Ok(record)
    }
}

/// Read every well-formed document from the log. Bad lines are skipped.
fn read_log(path: &Path) -> Result<Vec<StoredMessage>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let mut docs = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredMessage>(line) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!("Skipping unreadable line {} of {}: {}", n + 1, path.display(), e),
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticipantId;
    use crate::store::MESSAGES_COLLECTION;
    use chrono::Utc;
    use std::time::Duration;

    fn draft(sender: &str, body: &str) -> MessageDraft {
        MessageDraft {
            sender_id: ParticipantId::new(sender),
            sender_display_name: sender.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        }
    }

    fn key(raw: &str) -> RoomKey {
        RoomKey::from_raw(raw)
    }

    #[test]
    fn test_append_assigns_increasing_seq() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();

        let a = store.append(&key("a_b_p"), draft("a", "one")).unwrap();
        let b = store.append(&key("a_b_p"), draft("b", "two")).unwrap();
        assert!(b.seq > a.seq);
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = LocalStore::open(dir.path()).unwrap();
            store.append(&key("a_b_p"), draft("a", "one")).unwrap();
            store.append(&key("a_c"), draft("c", "two")).unwrap();
        }

        let mut store = LocalStore::open(dir.path()).unwrap();
        let all = store.query_all(MESSAGES_COLLECTION);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].body, "one");

        // Sequence continues after the highest stored value.
        let next = store.append(&key("a_c"), draft("a", "three")).unwrap();
        assert_eq!(next.seq, 3);
    }

    #[test]
    fn test_query_all_matches_collection_group() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        store.append(&key("a_b"), draft("a", "hi")).unwrap();

        assert_eq!(store.query_all(MESSAGES_COLLECTION).len(), 1);
        assert!(store.query_all("products").is_empty());
    }

    #[test]
    fn test_append_rejects_malformed_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        let err = store.append(&key("lonely"), draft("a", "hi")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoom(_)));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_unreadable_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = LocalStore::open(dir.path()).unwrap();
            store.append(&key("a_b"), draft("a", "kept")).unwrap();
        }
        let path = dir.path().join(LOG_FILE);
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{not json\n");
        fs::write(&path, content).unwrap();

        let store = LocalStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_translation_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        let msg = store.append(&key("a_b"), draft("a", "hola")).unwrap();

        let updated = store.set_translation(&msg.id, "hello").unwrap();
        assert_eq!(updated.translated_body.as_deref(), Some("hello"));
        assert_eq!(updated.seq, msg.seq);

        let reopened = LocalStore::open(dir.path()).unwrap();
        let all = reopened.query_all(MESSAGES_COLLECTION);
        assert_eq!(all[0].translated_body.as_deref(), Some("hello"));
        assert_eq!(all[0].body, "hola");
    }

    #[test]
    fn test_set_translation_unknown_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        let err = store.set_translation("nope", "x").unwrap_err();
        assert!(matches!(err, StoreError::MessageNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_subscribe_receives_matching_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        let mut feed = store.subscribe(RoomFilter::Room(key("a_b")));

        store.append(&key("a_c"), draft("a", "elsewhere")).unwrap();
        store.append(&key("a_b"), draft("b", "here")).unwrap();

        let got = tokio::time::timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.body, "here");
    }

    #[tokio::test]
    async fn test_refresh_publishes_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = LocalStore::open(dir.path()).unwrap();
        let mut feed = watcher.subscribe(RoomFilter::Participant(ParticipantId::new("a")));

        let mut writer = LocalStore::open(dir.path()).unwrap();
        writer.append(&key("a_b"), draft("b", "from elsewhere")).unwrap();

        assert_eq!(watcher.refresh().unwrap(), 1);
        assert_eq!(watcher.refresh().unwrap(), 0);

        let got = tokio::time::timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.body, "from elsewhere");
    }

    #[test]
    fn test_lagging_subscriber_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        let mut feed = store.subscribe(RoomFilter::Room(key("a_b")));

        for i in 0..FEED_CAPACITY + 10 {
            store.append(&key("a_b"), draft("a", &i.to_string())).unwrap();
        }

        // The oldest ten were overwritten; the feed resumes after them.
        let got = tokio_test::block_on(feed.next()).unwrap();
        assert_eq!(got.body, "10");
    }

    #[test]
    fn test_writers_sharing_a_log_keep_unique_seq() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = LocalStore::open(dir.path()).unwrap();
        let mut b = LocalStore::open(dir.path()).unwrap();

        let first = a.append(&key("a_b"), draft("a", "one")).unwrap();
        let second = b.append(&key("a_b"), draft("b", "two")).unwrap();
        let third = a.append(&key("a_b"), draft("a", "three")).unwrap();
        assert!(first.seq < second.seq && second.seq < third.seq);

        let reopened = LocalStore::open(dir.path()).unwrap();
        let mut seqs: Vec<u64> = reopened
            .query_all(MESSAGES_COLLECTION)
            .iter()
            .map(|m| m.seq)
            .collect();
        seqs.dedup();
        assert_eq!(seqs.len(), 3);
    }

    #[test]
    fn test_translation_keeps_other_writers_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = LocalStore::open(dir.path()).unwrap();
        let mut b = LocalStore::open(dir.path()).unwrap();

        let msg = a.append(&key("a_b"), draft("a", "hola")).unwrap();
        b.append(&key("a_b"), draft("b", "written meanwhile")).unwrap();
        a.set_translation(&msg.id, "hello").unwrap();

        let reopened = LocalStore::open(dir.path()).unwrap();
        let bodies: Vec<String> = reopened
            .query_all(MESSAGES_COLLECTION)
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, vec!["hola", "written meanwhile"]);
    }

    #[test]
    fn test_max_seq_in_log_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = LocalStore::open(dir.path()).unwrap();
            store.append(&key("a_b"), draft("a", "one")).unwrap();
        }
        let path = dir.path().join(LOG_FILE);
        let content = fs::read_to_string(&path)
            .unwrap()
            .replace("\"seq\":1", &format!("\"seq\":{}", u64::MAX));
        fs::write(&path, content).unwrap();

        let mut store = LocalStore::open(dir.path()).unwrap();
        assert_eq!(store.query_all(MESSAGES_COLLECTION)[0].seq, u64::MAX);
        let next = store.append(&key("a_b"), draft("b", "two")).unwrap();
        assert_eq!(next.seq, u64::MAX);
    }
}
