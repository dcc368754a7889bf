//! Deacon Test Utilities
//!
//! Centralized test infrastructure for the Deacon workspace:
//! - Contact and note fixtures
//! - A scripted fake remote that records calls and injects failures
//! - Proptest generators for contacts and notes

// Re-export the in-memory store from its source crate
pub use deacon_storage::InMemoryStore;

// Re-export core types for convenience
pub use deacon_core::{
    ActivityRecord, Author, Connected, ConnectionData, ConnectionNote, ConnectionType, Contact,
    ContactId, ContactListId, DeaconError, DeaconResult, HouseholdId, HouseholdRecord,
    HouseholdRole, Households, NewConnection, Note, NoteId, RealmRef, RemoteError, SimpleNote,
    SimpleNoteData, Timestamp,
};

use async_trait::async_trait;
use chrono::TimeZone;
use deacon_client::{ConnectionSink, ContactSource, NoteSource};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// FIXTURES
// ============================================================================

/// Fixed instant used as the `when` of bulk writes in tests.
pub fn fixed_time() -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

/// A contact in `household` with the given role and names.
pub fn member(
    id: &str,
    household: &str,
    role: HouseholdRole,
    first_name: &str,
    last_name: &str,
) -> Contact {
    let mut contact = Contact::new(id);
    contact.household_id = Some(HouseholdId::new(household));
    contact.household_role = role;
    contact.first_name = first_name.to_string();
    contact.last_name = last_name.to_string();
    contact
}

pub fn parent(id: &str, household: &str, last_name: &str) -> Contact {
    member(id, household, HouseholdRole::Parent, "Parent", last_name)
}

pub fn child(id: &str, household: &str, last_name: &str) -> Contact {
    member(id, household, HouseholdRole::Child, "Child", last_name)
}

pub fn with_email(mut contact: Contact, email: &str) -> Contact {
    contact.emails.push(email.to_string());
    contact
}

pub fn with_realm(mut contact: Contact, id: &str, title: &str) -> Contact {
    contact.realms.push(RealmRef::new(id, title));
    contact
}

/// Add an activity record updated at `updated`.
pub fn with_activity(mut contact: Contact, updated: &str) -> Contact {
    let id = format!("post-{}-{}", contact.id, contact.posts.all.len());
    contact.posts.all.push(ActivityRecord {
        id,
        updated: Some(updated.to_string()),
        ..Default::default()
    });
    contact
}

/// Two households and a contact with no household.
///
/// - `household-1` (Smith): `parent1` and `parent2` with email, activity and
///   the "Deacon Care Group A" realm, plus `child1`.
/// - `household-2` (Johnson): `parent3` with activity but no email.
/// - `solo`: no household, email, no activity.
pub fn sample_contacts() -> Vec<Contact> {
    let care_group = |contact| with_realm(contact, "realm-2", "Deacon Care Group A");
    vec![
        care_group(with_activity(
            with_email(
                member("parent1", "household-1", HouseholdRole::Parent, "John", "Smith"),
                "john@example.com",
            ),
            "2024-01-01T00:00:00Z",
        )),
        care_group(with_activity(
            with_email(
                member("parent2", "household-1", HouseholdRole::Parent, "Jane", "Smith"),
                "jane@example.com",
            ),
            "2024-01-15T00:00:00Z",
        )),
        with_email(
            member("child1", "household-1", HouseholdRole::Child, "Jimmy", "Smith"),
            "jimmy@example.com",
        ),
        with_activity(
            member("parent3", "household-2", HouseholdRole::Parent, "Bob", "Johnson"),
            "2023-12-01T00:00:00Z",
        ),
        with_email(Contact::new("solo"), "solo@example.com"),
    ]
}

pub fn simple_note(id: &str, created: &str, body: &str) -> Note {
    Note::Simple(SimpleNote {
        id: NoteId::new(id),
        created: Some(created.to_string()),
        author: Author {
            name: "Pastor Smith".to_string(),
            id: Some("user-1".to_string()),
        },
        data: SimpleNoteData {
            body: body.to_string(),
        },
    })
}

pub fn connection_note(id: &str, created: &str, connection_type: ConnectionType) -> Note {
    Note::Connection(ConnectionNote {
        id: NoteId::new(id),
        created: Some(created.to_string()),
        author: Author {
            name: "Deacon Johnson".to_string(),
            id: Some("user-2".to_string()),
        },
        data: ConnectionData {
            connection_type,
            connected: Connected::Yes,
            comments: "Called to check in on family".to_string(),
            when: Some(created.to_string()),
        },
    })
}

// ============================================================================
// SCRIPTED REMOTE
// ============================================================================

/// A call received by [`ScriptedRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    ListMembers(ContactListId),
    FetchNotes(ContactId),
    CreateConnection {
        contact_id: ContactId,
        connection: NewConnection,
    },
}

/// In-memory stand-in for the remote API.
///
/// Answers from scripted data, records every call in order and fails the
/// calls it was told to fail.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    lists: HashMap<ContactListId, Vec<Contact>>,
    notes: HashMap<ContactId, Vec<Note>>,
    failing_lists: HashSet<ContactListId>,
    failing_notes: HashSet<ContactId>,
    /// Remaining failures per contact; decremented on each failed attempt.
    failing_writes: Mutex<HashMap<ContactId, u32>>,
    write_latency: Duration,
    calls: Mutex<Vec<RemoteCall>>,
    in_flight_writes: AtomicUsize,
    max_in_flight_writes: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list_id: &str, contacts: Vec<Contact>) -> Self {
        self.lists.insert(ContactListId::new(list_id), contacts);
        self
    }

    pub fn with_notes(mut self, contact_id: &str, notes: Vec<Note>) -> Self {
        self.notes.insert(ContactId::new(contact_id), notes);
        self
    }

    pub fn failing_list(mut self, list_id: &str) -> Self {
        self.failing_lists.insert(ContactListId::new(list_id));
        self
    }

    pub fn failing_notes(mut self, contact_id: &str) -> Self {
        self.failing_notes.insert(ContactId::new(contact_id));
        self
    }

    /// Fail the next `times` connection writes for `contact_id`.
    pub fn failing_writes(self, contact_id: &str, times: u32) -> Self {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.insert(ContactId::new(contact_id), times);
        }
        self
    }

    /// Make every connection write take `latency` before answering.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn note_fetches(&self) -> Vec<ContactId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::FetchNotes(contact_id) => Some(contact_id),
                _ => None,
            })
            .collect()
    }

    /// Every connection write attempt, including failed ones, in call order.
    pub fn write_attempts(&self) -> Vec<(ContactId, NewConnection)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::CreateConnection {
                    contact_id,
                    connection,
                } => Some((contact_id, connection)),
                _ => None,
            })
            .collect()
    }

    pub fn attempts_for(&self, contact_id: &str) -> usize {
        self.write_attempts()
            .iter()
            .filter(|(id, _)| id.as_str() == contact_id)
            .count()
    }

    /// Highest number of connection writes observed in flight at once.
    pub fn max_concurrent_writes(&self) -> usize {
        self.max_in_flight_writes.load(Ordering::SeqCst)
    }

    fn record(&self, call: RemoteCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn should_fail_write(&self, contact_id: &ContactId) -> bool {
        let Ok(mut failing) = self.failing_writes.lock() else {
            return false;
        };
        match failing.get_mut(contact_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

fn scripted_failure(path: String, status: u16, message: &str) -> DeaconError {
    RemoteError::RequestFailed {
        path,
        status,
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl ContactSource for ScriptedRemote {
    async fn list_members(&self, list_id: &ContactListId) -> DeaconResult<Vec<Contact>> {
        self.record(RemoteCall::ListMembers(list_id.clone()));
        if self.failing_lists.contains(list_id) {
            return Err(scripted_failure(
                format!("/content/get/{list_id}"),
                500,
                "List unavailable",
            ));
        }
        Ok(self.lists.get(list_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl NoteSource for ScriptedRemote {
    async fn fetch_notes(&self, contact_id: &ContactId) -> DeaconResult<Vec<Note>> {
        self.record(RemoteCall::FetchNotes(contact_id.clone()));
        if self.failing_notes.contains(contact_id) {
            return Err(scripted_failure(
                format!("/info/posts?contact={contact_id}"),
                503,
                "Notes unavailable",
            ));
        }
        Ok(self.notes.get(contact_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ConnectionSink for ScriptedRemote {
    async fn create_connection(
        &self,
        contact_id: &ContactId,
        connection: &NewConnection,
    ) -> DeaconResult<()> {
        self.record(RemoteCall::CreateConnection {
            contact_id: contact_id.clone(),
            connection: connection.clone(),
        });

        let in_flight = self.in_flight_writes.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_writes.fetch_max(in_flight, Ordering::SeqCst);
        if !self.write_latency.is_zero() {
            tokio::time::sleep(self.write_latency).await;
        }
        self.in_flight_writes.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail_write(contact_id) {
            return Err(scripted_failure(
                format!("/post/{contact_id}/connection"),
                429,
                "Too many requests",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_role() -> impl Strategy<Value = HouseholdRole> {
        prop_oneof![Just(HouseholdRole::Parent), Just(HouseholdRole::Child)]
    }

    pub fn arb_timestamp() -> impl Strategy<Value = String> {
        (2020u32..2025, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}T00:00:00Z"))
    }

    /// Contacts spread over a handful of households, some with none.
    pub fn arb_contact() -> impl Strategy<Value = Contact> {
        (
            "[a-z0-9]{4,10}",
            prop::option::of(0u8..6),
            arb_role(),
            "[A-Z][a-z]{1,8}",
            prop::collection::vec(arb_timestamp(), 0..3),
            prop::option::of(arb_timestamp()),
            prop::collection::vec("[a-z]{1,6}@example\\.org", 0..2),
        )
            .prop_map(
                |(id, household, role, last_name, activity, updated, emails)| {
                    let mut contact = Contact::new(id);
                    contact.household_id =
                        household.map(|n| HouseholdId::new(format!("household-{n}")));
                    contact.household_role = role;
                    contact.last_name = last_name;
                    contact.updated = updated;
                    contact.emails = emails;
                    for stamp in activity {
                        contact = with_activity(contact, &stamp);
                    }
                    contact
                },
            )
    }

    pub fn arb_contacts(max: usize) -> impl Strategy<Value = Vec<Contact>> {
        prop::collection::vec(arb_contact(), 0..max)
    }

    pub fn arb_note() -> impl Strategy<Value = Note> {
        ("[a-z0-9]{4,8}", arb_timestamp(), any::<bool>()).prop_map(|(id, created, simple)| {
            if simple {
                simple_note(&id, &created, "note body")
            } else {
                connection_note(&id, &created, ConnectionType::Phone)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_write_failures_are_consumed() {
        let remote = ScriptedRemote::new().failing_writes("c1", 2);
        let connection = NewConnection::for_contact(
            &Contact::new("c1"),
            ConnectionType::Email,
            Connected::Yes,
            "hello",
            fixed_time(),
        );
        let id = ContactId::new("c1");

        assert!(remote.create_connection(&id, &connection).await.is_err());
        assert!(remote.create_connection(&id, &connection).await.is_err());
        assert!(remote.create_connection(&id, &connection).await.is_ok());
        assert_eq!(remote.attempts_for("c1"), 3);
    }

    #[test]
    fn test_sample_contacts_shape() {
        let contacts = sample_contacts();
        assert_eq!(contacts.len(), 5);
        assert_eq!(contacts.iter().filter(|c| c.is_child()).count(), 1);
        assert_eq!(contacts.iter().filter(|c| c.has_activity()).count(), 3);
    }
}
