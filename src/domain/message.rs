use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Wire field holding the author's identity.
pub const SENDER_FIELD: &str = "Sender";
/// Wire field holding the message text.
pub const BODY_FIELD: &str = "MessageBody";

/// Collection names double as journal file stems, so only ASCII letters,
/// digits, `_` and `-` are allowed.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// A chat message as it lives in the feed.
///
/// Two messages with the same sender and body are still distinct entities;
/// only their feed position tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "Sender")]
    pub sender: String,
    #[serde(rename = "MessageBody")]
    pub body: String,
}

impl Message {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }

    /// Builds the record payload appended to the remote collection.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(SENDER_FIELD.to_owned(), Value::String(self.sender.clone()));
        fields.insert(BODY_FIELD.to_owned(), Value::String(self.body.clone()));
        fields
    }

    pub fn from_record(record: &FeedRecord) -> Result<Self, ParseError> {
        let sender = required_text(record, SENDER_FIELD)?;
        let body = required_text(record, BODY_FIELD)?;

        Ok(Self::new(sender, body))
    }
}

/// Raw "child added" payload delivered by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    /// Store-generated ordering key. Never chosen by the client.
    pub key: String,
    pub fields: Map<String, Value>,
}

impl FeedRecord {
    pub fn new(key: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("record {key} is missing field {field}")]
    MissingField { key: String, field: &'static str },
    #[error("record {key} has non-text field {field}")]
    NotText { key: String, field: &'static str },
    #[error("record {key} has empty field {field}")]
    EmptyField { key: String, field: &'static str },
}

fn required_text(record: &FeedRecord, field: &'static str) -> Result<String, ParseError> {
    let value = record
        .fields
        .get(field)
        .ok_or_else(|| ParseError::MissingField {
            key: record.key.clone(),
            field,
        })?;

    let Value::String(text) = value else {
        return Err(ParseError::NotText {
            key: record.key.clone(),
            field,
        });
    };

    if text.is_empty() {
        return Err(ParseError::EmptyField {
            key: record.key.clone(),
            field,
        });
    }

    Ok(text.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names_are_limited_to_file_safe_characters() {
        assert!(is_valid_collection_name("Messages"));
        assert!(is_valid_collection_name("lobby_chat-2"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("Lobby chat"));
        assert!(!is_valid_collection_name("../escape"));
    }

    fn record(key: &str, value: Value) -> FeedRecord {
        let Value::Object(fields) = value else {
            panic!("fixture must be an object");
        };
        FeedRecord::new(key, fields)
    }

    #[test]
    fn parses_well_formed_record() {
        let record = record("-k1", json!({"Sender": "a@x.com", "MessageBody": "hi"}));

        let message = Message::from_record(&record).expect("record should parse");

        assert_eq!(message, Message::new("a@x.com", "hi"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let record = record(
            "-k1",
            json!({"Sender": "a@x.com", "MessageBody": "hi", "Extra": 7}),
        );

        assert!(Message::from_record(&record).is_ok());
    }

    #[test]
    fn rejects_record_without_body() {
        let record = record("-k2", json!({"Sender": "a@x.com"}));

        assert_eq!(
            Message::from_record(&record),
            Err(ParseError::MissingField {
                key: "-k2".to_owned(),
                field: BODY_FIELD,
            })
        );
    }

    #[test]
    fn rejects_record_without_sender() {
        let record = record("-k3", json!({"MessageBody": "hi"}));

        assert!(matches!(
            Message::from_record(&record),
            Err(ParseError::MissingField { field: SENDER_FIELD, .. })
        ));
    }

    #[test]
    fn rejects_non_text_and_empty_fields() {
        let numeric = record("-k4", json!({"Sender": 12, "MessageBody": "hi"}));
        let empty = record("-k5", json!({"Sender": "a@x.com", "MessageBody": ""}));

        assert!(matches!(
            Message::from_record(&numeric),
            Err(ParseError::NotText { .. })
        ));
        assert!(matches!(
            Message::from_record(&empty),
            Err(ParseError::EmptyField { .. })
        ));
    }

    #[test]
    fn to_fields_uses_wire_names() {
        let fields = Message::new("a@x.com", "hello").to_fields();

        assert_eq!(fields.get("Sender"), Some(&json!("a@x.com")));
        assert_eq!(fields.get("MessageBody"), Some(&json!("hello")));
        assert_eq!(fields.len(), 2);
    }
}
