//! Remote collaborator seams.
//!
//! The data layer only ever talks to the remote through these traits, so
//! tests and alternative transports can stand in for [`crate::RestClient`].

use async_trait::async_trait;
use deacon_core::{Contact, ContactId, ContactListId, DeaconResult, NewConnection};

pub use deacon_households::NoteSource;

/// Reads the members of a contact list.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn list_members(&self, list_id: &ContactListId) -> DeaconResult<Vec<Contact>>;
}

/// Writes connection records.
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Create one connection record on `contact_id`.
    async fn create_connection(
        &self,
        contact_id: &ContactId,
        connection: &NewConnection,
    ) -> DeaconResult<()>;
}

/// Everything the data layer needs from the remote.
pub trait Remote: ContactSource + NoteSource + ConnectionSink {}

impl<T: ContactSource + NoteSource + ConnectionSink + ?Sized> Remote for T {}
