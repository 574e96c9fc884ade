//! Single long-lived subscription to the remote message collection.
//!
//! The store pushes records through the handler given to [`FeedSubscriber::subscribe`];
//! the shell forwards them back to [`FeedSubscriber::deliver`] on the event loop,
//! which is the only place the feed is mutated.

use crate::domain::{
    events::{StoreError, SubscriptionHandle},
    message::{FeedRecord, Message, ParseError},
    message_feed::MessageFeed,
};

use super::contracts::{MessageStore, RecordHandler};

const FEED_SUBSCRIBED: &str = "FEED_SUBSCRIBED";
const FEED_SUBSCRIBE_REPEATED: &str = "FEED_SUBSCRIBE_REPEATED";
const FEED_CANCELLED: &str = "FEED_CANCELLED";
const FEED_RECORD_DROPPED: &str = "FEED_RECORD_DROPPED";
const FEED_STALE_RECORD_IGNORED: &str = "FEED_STALE_RECORD_IGNORED";

/// What happened to a delivered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Appended,
    /// Record belonged to a subscription that is no longer open.
    Stale,
}

#[derive(Debug)]
pub struct FeedSubscriber<S: MessageStore> {
    store: S,
    collection: String,
    handle: Option<SubscriptionHandle>,
    feed: MessageFeed,
}

impl<S: MessageStore> FeedSubscriber<S> {
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            handle: None,
            feed: MessageFeed::default(),
        }
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    #[cfg(test)]
    pub fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }

    /// Opens the subscription. Calling it again while open is a no-op that
    /// returns the existing handle and drops `on_append`.
    pub fn subscribe(
        &mut self,
        on_append: RecordHandler,
    ) -> Result<SubscriptionHandle, StoreError> {
        if let Some(handle) = self.handle {
            tracing::debug!(
                code = FEED_SUBSCRIBE_REPEATED,
                subscription = handle.0,
                "subscription already open"
            );
            return Ok(handle);
        }

        let handle = self
            .store
            .subscribe_child_added(&self.collection, on_append)?;
        self.handle = Some(handle);

        tracing::info!(
            code = FEED_SUBSCRIBED,
            subscription = handle.0,
            collection = %self.collection,
            "feed subscription opened"
        );
        Ok(handle)
    }

    /// Appends one delivered record to the feed.
    ///
    /// A malformed record is logged and dropped; the subscription stays open.
    pub fn deliver(
        &mut self,
        subscription: SubscriptionHandle,
        record: &FeedRecord,
    ) -> Result<Delivery, ParseError> {
        if self.handle != Some(subscription) {
            tracing::debug!(
                code = FEED_STALE_RECORD_IGNORED,
                subscription = subscription.0,
                key = %record.key,
                "record for closed subscription ignored"
            );
            return Ok(Delivery::Stale);
        }

        match Message::from_record(record) {
            Ok(message) => {
                self.feed.push(message);
                Ok(Delivery::Appended)
            }
            Err(error) => {
                tracing::warn!(
                    code = FEED_RECORD_DROPPED,
                    key = %record.key,
                    error = %error,
                    "malformed feed record dropped"
                );
                Err(error)
            }
        }
    }

    /// Closes the subscription. No record is accepted afterwards.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.store.unsubscribe(handle);
            tracing::info!(
                code = FEED_CANCELLED,
                subscription = handle.0,
                delivered = self.feed.len(),
                "feed subscription cancelled"
            );
        }
    }
}

impl<S: MessageStore> Drop for FeedSubscriber<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
