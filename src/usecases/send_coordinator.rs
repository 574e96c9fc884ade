//! Use case for sending a composed message to the remote collection.
//!
//! Sending is split in two phases: [`SendCoordinator::send`] validates and
//! dispatches the append, and [`SendCoordinator::acknowledge`] applies the
//! store's answer once it arrives on the event loop. The sent message is never
//! inserted locally; it shows up when the subscription echoes it back.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{
    compose_buffer::ComposeBuffer, composition::CompositionState, events::StoreError,
    identity::Identity, message::Message,
};

use super::contracts::MessageStore;

const SEND_DISPATCHED: &str = "SEND_DISPATCHED";
const SEND_ACKNOWLEDGED: &str = "SEND_ACKNOWLEDGED";
const SEND_TRANSPORT_FAILED: &str = "SEND_TRANSPORT_FAILED";
const SEND_UNEXPECTED_ACK: &str = "SEND_UNEXPECTED_ACK";

/// Receives append outcomes; typically forwards them to the event loop.
pub type AckSink = Arc<dyn Fn(Result<(), StoreError>) + Send + Sync + 'static>;

/// Why a send request was refused before reaching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    AlreadySubmitting,
    NotSignedIn,
    EmptyBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("send blocked: {0:?}")]
    Blocked(BlockReason),
    #[error("send failed: {0}")]
    Transport(#[source] StoreError),
}

pub struct SendCoordinator<S: MessageStore> {
    store: S,
    collection: String,
    state: CompositionState,
    ack: AckSink,
}

impl<S: MessageStore> SendCoordinator<S> {
    pub fn new(store: S, collection: impl Into<String>, ack: AckSink) -> Self {
        Self {
            store,
            collection: collection.into(),
            state: CompositionState::Idle,
            ack,
        }
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    /// Dispatches an append of `body` authored by `identity`.
    ///
    /// Returns as soon as the append is handed to the store. No store call is
    /// made when the request is blocked.
    pub fn send(&mut self, body: &str, identity: Option<&Identity>) -> Result<(), SendError> {
        if self.state.is_submitting() {
            return Err(SendError::Blocked(BlockReason::AlreadySubmitting));
        }

        let Some(identity) = identity else {
            return Err(SendError::Blocked(BlockReason::NotSignedIn));
        };

        if body.trim().is_empty() {
            return Err(SendError::Blocked(BlockReason::EmptyBody));
        }

        self.state = CompositionState::Submitting;
        let message = Message::new(identity.as_str(), body);

        tracing::debug!(
            code = SEND_DISPATCHED,
            collection = %self.collection,
            body_chars = body.chars().count(),
            "append dispatched"
        );

        let ack = Arc::clone(&self.ack);
        self.store.append(
            &self.collection,
            message.to_fields(),
            Box::new(move |outcome| ack(outcome)),
        );

        Ok(())
    }

    /// Applies the store's acknowledgment. Clears `compose` on success and
    /// keeps it on failure. Never retries.
    pub fn acknowledge(
        &mut self,
        outcome: Result<(), StoreError>,
        compose: &mut ComposeBuffer,
    ) -> Result<(), SendError> {
        if !self.state.is_submitting() {
            tracing::warn!(
                code = SEND_UNEXPECTED_ACK,
                "acknowledgment received with no send in flight"
            );
        }
        self.state = CompositionState::Idle;

        match outcome {
            Ok(()) => {
                compose.clear();
                tracing::debug!(code = SEND_ACKNOWLEDGED, "append acknowledged");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    code = SEND_TRANSPORT_FAILED,
                    error = %error,
                    "append failed; compose buffer kept"
                );
                Err(SendError::Transport(error))
            }
        }
    }
}
