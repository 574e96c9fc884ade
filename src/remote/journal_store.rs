//! Message store backed by one JSON-lines journal per collection.
//!
//! Several client processes pointed at the same directory share the feed:
//! appends are serialized with an exclusive file lock, and each subscription
//! runs a follower thread that replays the journal from the start and then
//! polls it for new lines.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, RecvTimeoutError, Sender},
        Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use fs2::FileExt;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    domain::{
        events::{StoreError, SubscriptionHandle},
        message::{is_valid_collection_name, FeedRecord},
    },
    infra::error::AppError,
    usecases::contracts::{AppendCallback, MessageStore, RecordHandler},
};

const JOURNAL_EXTENSION: &str = "jsonl";
const JOURNAL_FOLLOWER_STARTED: &str = "JOURNAL_FOLLOWER_STARTED";
const JOURNAL_FOLLOWER_STOPPED: &str = "JOURNAL_FOLLOWER_STOPPED";
const JOURNAL_FOLLOWER_READ_FAILED: &str = "JOURNAL_FOLLOWER_READ_FAILED";
const JOURNAL_LINE_CORRUPT: &str = "JOURNAL_LINE_CORRUPT";
const JOURNAL_FOLLOWER_SHUTDOWN_FAILED: &str = "JOURNAL_FOLLOWER_SHUTDOWN_FAILED";

#[derive(Debug)]
pub struct JournalMessageStore {
    root: PathBuf,
    poll_interval: Duration,
    next_handle: AtomicU64,
    followers: Mutex<HashMap<SubscriptionHandle, Follower>>,
}

#[derive(Debug)]
struct Follower {
    stop_tx: Sender<()>,
    worker: JoinHandle<()>,
}

impl JournalMessageStore {
    pub fn open(root: &Path, poll_interval: Duration) -> Result<Self, AppError> {
        fs::create_dir_all(root).map_err(|source| AppError::StorageDirCreate {
            path: root.to_path_buf(),
            source,
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            poll_interval,
            next_handle: AtomicU64::new(1),
            followers: Mutex::new(HashMap::new()),
        })
    }

    fn journal_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_collection_name(collection) {
            return Err(StoreError::Rejected(format!(
                "invalid collection name: {collection:?}"
            )));
        }

        Ok(self
            .root
            .join(format!("{collection}.{JOURNAL_EXTENSION}")))
    }

    fn write_record(&self, collection: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let path = self.journal_path(collection)?;
        let record = FeedRecord::new(format!("-{}", Uuid::new_v4().simple()), fields);

        let mut line = serde_json::to_vec(&record)
            .map_err(|error| StoreError::Rejected(error.to_string()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(unavailable)?;

        FileExt::lock_exclusive(&file).map_err(unavailable)?;
        let written = file.write_all(&line).and_then(|()| file.flush());
        let unlocked = FileExt::unlock(&file);
        written.map_err(unavailable)?;
        unlocked.map_err(unavailable)
    }

    fn stop_follower(handle: SubscriptionHandle, follower: Follower) {
        let _ = follower.stop_tx.send(());
        if let Err(error) = follower.worker.join() {
            tracing::warn!(
                code = JOURNAL_FOLLOWER_SHUTDOWN_FAILED,
                subscription = handle.0,
                error = ?error,
                "journal follower panicked on shutdown"
            );
        }
    }
}

impl MessageStore for JournalMessageStore {
    /// The write completes before this returns; `on_complete` runs on the
    /// calling thread.
    fn append(&self, collection: &str, fields: Map<String, Value>, on_complete: AppendCallback) {
        on_complete(self.write_record(collection, fields));
    }

    fn subscribe_child_added(
        &self,
        collection: &str,
        handler: RecordHandler,
    ) -> Result<SubscriptionHandle, StoreError> {
        let path = self.journal_path(collection)?;
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let poll_interval = self.poll_interval;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name(format!("flashchat-journal-{}", handle.0))
            .spawn(move || run_follower(path, handle, handler, stop_rx, poll_interval))
            .map_err(unavailable)?;

        tracing::info!(
            code = JOURNAL_FOLLOWER_STARTED,
            subscription = handle.0,
            collection,
            "journal follower started"
        );

        self.followers
            .lock()
            .map_err(|_| StoreError::Unavailable("follower registry poisoned".to_owned()))?
            .insert(handle, Follower { stop_tx, worker });

        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let follower = match self.followers.lock() {
            Ok(mut followers) => followers.remove(&handle),
            Err(poisoned) => poisoned.into_inner().remove(&handle),
        };

        if let Some(follower) = follower {
            Self::stop_follower(handle, follower);
        }
    }
}

impl Drop for JournalMessageStore {
    fn drop(&mut self) {
        let followers = match self.followers.get_mut() {
            Ok(followers) => std::mem::take(followers),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };

        for (handle, follower) in followers {
            Self::stop_follower(handle, follower);
        }
    }
}

fn run_follower(
    path: PathBuf,
    handle: SubscriptionHandle,
    handler: RecordHandler,
    stop_rx: mpsc::Receiver<()>,
    poll_interval: Duration,
) {
    let mut cursor = JournalCursor::default();

    loop {
        match cursor.read_new_records(&path) {
            Ok(records) => {
                for record in records {
                    handler(handle, record);
                }
            }
            Err(error) => {
                tracing::warn!(
                    code = JOURNAL_FOLLOWER_READ_FAILED,
                    subscription = handle.0,
                    error = %error,
                    "journal read failed; keeping follower alive"
                );
            }
        }

        match stop_rx.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                tracing::info!(
                    code = JOURNAL_FOLLOWER_STOPPED,
                    subscription = handle.0,
                    "journal follower stopped"
                );
                return;
            }
        }
    }
}

/// Read position in a journal plus any trailing bytes of an unfinished line.
#[derive(Debug, Default)]
struct JournalCursor {
    offset: u64,
    line_no: u64,
    pending: Vec<u8>,
}

impl JournalCursor {
    fn read_new_records(&mut self, path: &Path) -> std::io::Result<Vec<FeedRecord>> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error),
        };

        FileExt::lock_shared(&file)?;
        let read = read_from(&mut file, self.offset);
        FileExt::unlock(&file)?;
        let chunk = read?;

        self.offset += chunk.len() as u64;
        self.pending.extend_from_slice(&chunk);

        let mut records = Vec::new();
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.line_no += 1;

            let line = &line[..line.len() - 1];
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<FeedRecord>(line) {
                Ok(record) => records.push(record),
                Err(error) => tracing::warn!(
                    code = JOURNAL_LINE_CORRUPT,
                    path = %path.display(),
                    line = self.line_no,
                    error = %error,
                    "skipping corrupt journal line"
                ),
            }
        }

        Ok(records)
    }
}

fn read_from(file: &mut File, offset: u64) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut chunk = Vec::new();
    file.read_to_end(&mut chunk)?;
    Ok(chunk)
}

fn unavailable(error: std::io::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Receiver;

    use serde_json::json;

    use super::*;
    use crate::domain::message::Message;

    const COLLECTION: &str = "Messages";
    const WAIT: Duration = Duration::from_secs(5);

    fn store(dir: &Path) -> JournalMessageStore {
        JournalMessageStore::open(dir, Duration::from_millis(10)).expect("store should open")
    }

    fn append_ok(store: &JournalMessageStore, sender: &str, body: &str) {
        let (tx, rx) = mpsc::channel();
        store.append(
            COLLECTION,
            Message::new(sender, body).to_fields(),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.recv_timeout(WAIT)
            .expect("ack should arrive")
            .expect("append should succeed");
    }

    fn subscribe(store: &JournalMessageStore) -> (SubscriptionHandle, Receiver<FeedRecord>) {
        let (tx, rx) = mpsc::channel();
        let handle = store
            .subscribe_child_added(
                COLLECTION,
                Box::new(move |_, record| {
                    let _ = tx.send(record);
                }),
            )
            .expect("subscribe should succeed");
        (handle, rx)
    }

    fn body(record: &FeedRecord) -> String {
        Message::from_record(record)
            .expect("record should parse")
            .body
    }

    #[test]
    fn replays_existing_records_then_follows_live_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        append_ok(&store, "a@x.com", "one");
        append_ok(&store, "b@x.com", "two");

        let (_handle, rx) = subscribe(&store);
        assert_eq!(body(&rx.recv_timeout(WAIT).expect("replay 1")), "one");
        assert_eq!(body(&rx.recv_timeout(WAIT).expect("replay 2")), "two");

        append_ok(&store, "a@x.com", "three");
        assert_eq!(body(&rx.recv_timeout(WAIT).expect("live")), "three");
    }

    #[test]
    fn appends_from_another_store_instance_reach_subscriber() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = store(dir.path());
        let writer = store(dir.path());

        let (_handle, rx) = subscribe(&reader);
        append_ok(&writer, "b@x.com", "from elsewhere");

        assert_eq!(body(&rx.recv_timeout(WAIT).expect("live")), "from elsewhere");
    }

    #[test]
    fn no_delivery_after_unsubscribe_returns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        let (handle, rx) = subscribe(&store);

        store.unsubscribe(handle);
        append_ok(&store, "a@x.com", "too late");

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn keys_are_generated_and_unique() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        append_ok(&store, "a@x.com", "same");
        append_ok(&store, "a@x.com", "same");

        let (_handle, rx) = subscribe(&store);
        let first = rx.recv_timeout(WAIT).expect("first");
        let second = rx.recv_timeout(WAIT).expect("second");

        assert_ne!(first.key, second.key);
        assert!(first.key.starts_with('-'));
    }

    #[test]
    fn corrupt_lines_are_skipped_and_partial_lines_wait() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Messages.jsonl");
        let good = serde_json::to_string(&FeedRecord::new(
            "-k1",
            Message::new("a@x.com", "ok").to_fields(),
        ))
        .expect("serialize");
        fs::write(&path, format!("not json\n{good}\n{{\"key\":")).expect("write journal");

        let mut cursor = JournalCursor::default();
        let records = cursor.read_new_records(&path).expect("read");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "-k1");
        assert!(!cursor.pending.is_empty());
    }

    #[test]
    fn malformed_payloads_are_delivered_as_is() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        let Value::Object(fields) = json!({"Sender": "a@x.com"}) else {
            panic!("fixture must be an object");
        };
        store.append(COLLECTION, fields, Box::new(|_| {}));

        let (_handle, rx) = subscribe(&store);
        let record = rx.recv_timeout(WAIT).expect("record");

        assert!(Message::from_record(&record).is_err());
    }

    #[test]
    fn rejects_collection_names_that_escape_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        let (tx, rx) = mpsc::channel();

        store.append(
            "../outside",
            Map::new(),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );

        assert!(matches!(
            rx.recv_timeout(WAIT).expect("ack"),
            Err(StoreError::Rejected(_))
        ));
    }
}
