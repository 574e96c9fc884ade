use anyhow::Result;
use serde_json::{Map, Value};

use crate::domain::{
    events::{AppEvent, StoreError, SubscriptionHandle},
    identity::Identity,
    message::FeedRecord,
    shell_state::ShellState,
};

use super::session_gate::AuthError;

pub trait AppEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>>;
}

pub trait ShellOrchestrator {
    fn state(&self) -> &ShellState;
    fn handle_event(&mut self, event: AppEvent) -> Result<()>;
}

/// Invoked once per "child added" record, in store emission order.
pub type RecordHandler = Box<dyn Fn(SubscriptionHandle, FeedRecord) + Send + 'static>;

/// Invoked exactly once with the outcome of an append.
pub type AppendCallback = Box<dyn FnOnce(Result<(), StoreError>) + Send + 'static>;

/// Remote append-only collection with a "child added" feed.
pub trait MessageStore {
    /// Appends `fields` under a store-generated key. Returns immediately;
    /// the outcome arrives through `on_complete`.
    fn append(&self, collection: &str, fields: Map<String, Value>, on_complete: AppendCallback);

    /// Replays every existing record in append order, then every later
    /// append, with no gap between the two phases.
    fn subscribe_child_added(
        &self,
        collection: &str,
        handler: RecordHandler,
    ) -> Result<SubscriptionHandle, StoreError>;

    /// After this returns the handler for `handle` is never invoked again.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

impl<T: MessageStore + ?Sized> MessageStore for std::sync::Arc<T> {
    fn append(&self, collection: &str, fields: Map<String, Value>, on_complete: AppendCallback) {
        (**self).append(collection, fields, on_complete)
    }

    fn subscribe_child_added(
        &self,
        collection: &str,
        handler: RecordHandler,
    ) -> Result<SubscriptionHandle, StoreError> {
        (**self).subscribe_child_added(collection, handler)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        (**self).unsubscribe(handle)
    }
}

/// Remote credential service.
pub trait AuthService {
    fn current_user(&self) -> Option<Identity>;
    fn sign_out(&mut self) -> Result<(), AuthError>;
    fn create_user(&mut self, email: &str, password: &str) -> Result<Identity, AuthError>;
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError>;
}
