//! Note variants
//!
//! Notes come back from the remote as posts discriminated by their
//! `definition` field. Only two definitions are modelled; consumers match on
//! [`Note`] exhaustively.

use crate::entities::null_as_default;
use crate::{Connected, ConnectionType, Contact, ContactId, NoteId, RealmRef, Timestamp};
use serde::{Deserialize, Serialize};

/// Who wrote a note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Body of a free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleNoteData {
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

/// Structured body of a connection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub connection_type: ConnectionType,
    pub connected: Connected,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: String,
    /// When the contact occurred, as sent by the author.
    #[serde(default)]
    pub when: Option<String>,
}

/// A free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleNote {
    #[serde(rename = "_id")]
    pub id: NoteId,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub data: SimpleNoteData,
}

/// A connection record documenting an outreach attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionNote {
    #[serde(rename = "_id")]
    pub id: NoteId,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub author: Author,
    pub data: ConnectionData,
}

/// A note attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "definition")]
pub enum Note {
    #[serde(rename = "note")]
    Simple(SimpleNote),
    #[serde(rename = "connection")]
    Connection(ConnectionNote),
}

impl Note {
    pub fn id(&self) -> &NoteId {
        match self {
            Note::Simple(note) => &note.id,
            Note::Connection(note) => &note.id,
        }
    }

    pub fn created(&self) -> &str {
        match self {
            Note::Simple(note) => note.created.as_deref().unwrap_or(""),
            Note::Connection(note) => note.created.as_deref().unwrap_or(""),
        }
    }

    pub fn author(&self) -> &Author {
        match self {
            Note::Simple(note) => &note.author,
            Note::Connection(note) => &note.author,
        }
    }

    /// The `definition` tag this note carries on the wire.
    pub fn definition(&self) -> &'static str {
        match self {
            Note::Simple(_) => "note",
            Note::Connection(_) => "connection",
        }
    }

    /// One-line rendering used by compact note views.
    pub fn summary(&self) -> String {
        match self {
            Note::Simple(note) => note.data.body.clone(),
            Note::Connection(note) => {
                let mark = if note.data.connected.is_yes() { "✓" } else { "✗" };
                let comments = if note.data.comments.is_empty() {
                    "No comments"
                } else {
                    note.data.comments.as_str()
                };
                format!("{} ({}): {}", note.data.connection_type.label(), mark, comments)
            }
        }
    }
}

/// Payload for creating a connection record on a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
    pub data: ConnectionData,
    /// Realms copied from the owning contact so the record inherits its
    /// visibility scoping.
    pub realms: Vec<RealmRef>,
    pub parent: ContactId,
}

impl NewConnection {
    /// Build a connection payload for `contact`.
    pub fn for_contact(
        contact: &Contact,
        connection_type: ConnectionType,
        connected: Connected,
        comments: impl Into<String>,
        when: Timestamp,
    ) -> Self {
        Self {
            data: ConnectionData {
                connection_type,
                connected,
                comments: comments.into(),
                when: Some(when.to_rfc3339()),
            },
            realms: contact.realms.clone(),
            parent: contact.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_note_variants_parse_by_definition() {
        let notes: Vec<Note> = serde_json::from_value(json!([
            {
                "_id": "note-1",
                "definition": "note",
                "created": "2024-01-10T15:30:00Z",
                "author": { "name": "Pastor Smith", "_id": "user-1" },
                "data": { "body": "Had a great conversation about upcoming events." },
                "fullDefinition": { "definitionName": "note", "fields": [] }
            },
            {
                "_id": "note-2",
                "definition": "connection",
                "created": "2024-01-08T12:00:00Z",
                "author": { "name": "Deacon Johnson", "_id": "user-2" },
                "data": {
                    "comments": "Called to check in on family",
                    "connectionType": "phone",
                    "connected": "yes",
                    "when": "2024-01-08"
                }
            }
        ]))
        .unwrap();

        assert_eq!(notes.len(), 2);
        match &notes[0] {
            Note::Simple(note) => assert!(note.data.body.starts_with("Had a great")),
            Note::Connection(_) => panic!("expected a simple note"),
        }
        match &notes[1] {
            Note::Connection(note) => {
                assert_eq!(note.data.connection_type, ConnectionType::Phone);
                assert!(note.data.connected.is_yes());
            }
            Note::Simple(_) => panic!("expected a connection note"),
        }
        assert_eq!(notes[1].summary(), "Phone Call (✓): Called to check in on family");
        assert_eq!(notes[0].author().name, "Pastor Smith");
    }

    #[test]
    fn test_note_serializes_with_definition_tag() {
        let note = Note::Simple(SimpleNote {
            id: NoteId::new("n"),
            created: None,
            author: Author::default(),
            data: SimpleNoteData {
                body: "hi".to_string(),
            },
        });
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["definition"], "note");
        assert_eq!(note.definition(), "note");
    }

    #[test]
    fn test_new_connection_copies_realms() {
        let mut contact = Contact::new("parent-1");
        contact.realms = vec![RealmRef::new("realm-1", "Deacon Care Group - A")];
        let when = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

        let payload = NewConnection::for_contact(
            &contact,
            ConnectionType::Email,
            Connected::Yes,
            "Sent the monthly update",
            when,
        );

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["data"]["connectionType"], "email");
        assert_eq!(value["data"]["connected"], "yes");
        assert_eq!(value["data"]["comments"], "Sent the monthly update");
        assert_eq!(value["data"]["when"], "2024-01-15T12:00:00+00:00");
        assert_eq!(value["realms"][0]["_id"], "realm-1");
        assert_eq!(value["parent"], "parent-1");
    }
}
