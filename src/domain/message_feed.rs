use super::message::Message;

/// Ordered, append-only replica of the remote collection.
///
/// Only grows. Existing entries are never reordered or removed, so any
/// snapshot taken through [`MessageFeed::messages`] is a prefix of every
/// later snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFeed {
    messages: Vec<Message>,
}

impl MessageFeed {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_arrival_order() {
        let mut feed = MessageFeed::default();
        feed.push(Message::new("a@x.com", "one"));
        feed.push(Message::new("b@x.com", "two"));

        let bodies: Vec<_> = feed.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["one", "two"]);
    }

    #[test]
    fn duplicate_messages_are_kept_as_distinct_entries() {
        let mut feed = MessageFeed::default();
        feed.push(Message::new("a@x.com", "hi"));
        feed.push(Message::new("a@x.com", "hi"));

        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn earlier_snapshot_is_prefix_of_later_one() {
        let mut feed = MessageFeed::default();
        feed.push(Message::new("a@x.com", "one"));
        let before = feed.messages().to_vec();

        feed.push(Message::new("b@x.com", "two"));

        assert!(feed.messages().starts_with(&before));
    }
}
