use thiserror::Error;

use super::message::FeedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    QuitRequested,
    InputKey(KeyInput),
    /// A "child added" record delivered for the given subscription.
    FeedRecord {
        subscription: SubscriptionHandle,
        record: FeedRecord,
    },
    /// Remote acknowledgment of the in-flight append.
    SendAcknowledged(Result<(), StoreError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, ctrl: bool) -> Self {
        Self {
            key: key.into(),
            ctrl,
        }
    }
}

/// Opaque handle of an open "child added" subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
    #[error("message store rejected the record: {0}")]
    Rejected(String),
}
