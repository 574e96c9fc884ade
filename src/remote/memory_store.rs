//! Process-local message store with knobs for exercising send and feed paths.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::{Map, Value};

use crate::{
    domain::{
        events::{StoreError, SubscriptionHandle},
        message::FeedRecord,
    },
    usecases::contracts::{AppendCallback, MessageStore, RecordHandler},
};

#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    next_handle: u64,
    next_key: u64,
    collections: HashMap<String, Vec<FeedRecord>>,
    subscribers: Vec<MemorySubscriber>,
    append_calls: usize,
    fail_appends: bool,
    hold_acknowledgments: bool,
    held: Vec<(AppendCallback, Result<(), StoreError>)>,
}

struct MemorySubscriber {
    handle: SubscriptionHandle,
    collection: String,
    handler: RecordHandler,
}

impl InMemoryMessageStore {
    pub fn append_calls(&self) -> usize {
        self.lock().append_calls
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn records(&self, collection: &str) -> Vec<FeedRecord> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.lock().fail_appends = fail;
    }

    /// Queues acknowledgments until [`Self::release_acknowledgments`].
    pub fn hold_acknowledgments(&self, hold: bool) {
        self.lock().hold_acknowledgments = hold;
    }

    pub fn release_acknowledgments(&self) {
        let held = std::mem::take(&mut self.lock().held);
        for (callback, outcome) in held {
            callback(outcome);
        }
    }

    /// Stores an arbitrary payload, bypassing any shape expectations.
    pub fn push_raw(&self, collection: &str, payload: Value) {
        let fields = match payload {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let mut state = self.lock();
        state.insert(collection, fields);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MemoryState {
    // Handlers run under the lock so fan-out order matches append order.
    fn insert(&mut self, collection: &str, fields: Map<String, Value>) {
        self.next_key += 1;
        let record = FeedRecord::new(format!("-mem{:012}", self.next_key), fields);

        for subscriber in self
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.collection == collection)
        {
            (subscriber.handler)(subscriber.handle, record.clone());
        }

        self.collections
            .entry(collection.to_owned())
            .or_default()
            .push(record);
    }
}

impl MessageStore for InMemoryMessageStore {
    fn append(&self, collection: &str, fields: Map<String, Value>, on_complete: AppendCallback) {
        let mut state = self.lock();
        state.append_calls += 1;

        let outcome = if state.fail_appends {
            Err(StoreError::Unavailable("in-memory store set to fail".to_owned()))
        } else {
            state.insert(collection, fields);
            Ok(())
        };

        if state.hold_acknowledgments {
            state.held.push((on_complete, outcome));
            return;
        }

        drop(state);
        on_complete(outcome);
    }

    fn subscribe_child_added(
        &self,
        collection: &str,
        handler: RecordHandler,
    ) -> Result<SubscriptionHandle, StoreError> {
        let mut state = self.lock();
        state.next_handle += 1;
        let handle = SubscriptionHandle(state.next_handle);

        if let Some(existing) = state.collections.get(collection) {
            for record in existing {
                handler(handle, record.clone());
            }
        }

        state.subscribers.push(MemorySubscriber {
            handle,
            collection: collection.to_owned(),
            handler,
        });

        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.lock()
            .subscribers
            .retain(|subscriber| subscriber.handle != handle);
    }
}
