//! Pure derivation of display rows from the feed and the session identity.

use super::{identity::Identity, message::Message};

/// One render-ready row of the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub sender: String,
    pub body: String,
    pub is_own_message: bool,
}

/// Ownership only selects visual treatment. Every user sees every message.
pub fn is_own_message(sender: &str, identity: Option<&Identity>) -> bool {
    identity.is_some_and(|identity| identity.is_sender(sender))
}

/// Projects the full feed. Called after every feed mutation.
pub fn project(feed: &[Message], identity: Option<&Identity>) -> Vec<DisplayRow> {
    feed.iter()
        .map(|message| DisplayRow {
            sender: message.sender.clone(),
            body: message.body.clone(),
            is_own_message: is_own_message(&message.sender, identity),
        })
        .collect()
}
