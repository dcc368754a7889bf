//! Loading a contact list as enriched households through the optimistic cache.

use crate::remote::{ContactSource, NoteSource};
use deacon_core::{Contact, ContactId, ContactListId, DeaconResult, Households, Note};
use deacon_households::{email_recipients, FamilyGrouper, NoteEnricher};
use deacon_storage::{Optimistic, OptimisticCache};
use std::sync::Arc;

/// Wires the remote, the grouper, the enricher and the cache together.
pub struct ListLoader<R: ?Sized> {
    remote: Arc<R>,
    cache: OptimisticCache,
    grouper: FamilyGrouper,
}

impl<R> ListLoader<R>
where
    R: ContactSource + NoteSource + ?Sized + 'static,
{
    pub fn new(remote: Arc<R>, cache: OptimisticCache) -> Self {
        Self {
            remote,
            cache,
            grouper: FamilyGrouper::default(),
        }
    }

    pub fn with_grouper(mut self, grouper: FamilyGrouper) -> Self {
        self.grouper = grouper;
        self
    }

    pub fn list_cache_key(list_id: &ContactListId) -> String {
        format!("contacts-list-{list_id}")
    }

    pub fn notes_cache_key(contact_id: &ContactId) -> String {
        format!("notes:{contact_id}")
    }

    /// Cached households for `list_id` now, refreshed households later.
    ///
    /// The refresh fetches the members, groups them and attaches recent
    /// notes. Must be called from within a tokio runtime.
    pub fn load(&self, list_id: &ContactListId) -> Optimistic<Households> {
        let remote = Arc::clone(&self.remote);
        let grouper = self.grouper.clone();
        let list_id = list_id.clone();

        self.cache
            .cache(Self::list_cache_key(&list_id), move || async move {
                let contacts = remote.list_members(&list_id).await?;
                let households = grouper.group(contacts);
                Ok(NoteEnricher::new(remote).enrich(households).await)
            })
    }

    /// Cached notes for one contact now, fresh notes later.
    pub fn load_notes(&self, contact_id: &ContactId) -> Optimistic<Vec<Note>> {
        let remote = Arc::clone(&self.remote);
        let contact_id = contact_id.clone();

        self.cache
            .cache(Self::notes_cache_key(&contact_id), move || async move {
                remote.fetch_notes(&contact_id).await
            })
    }

    /// Members of `list_id` that should receive a bulk email. Not cached.
    pub async fn email_contacts(&self, list_id: &ContactListId) -> DeaconResult<Vec<Contact>> {
        let members = self.remote.list_members(list_id).await?;
        Ok(email_recipients(&members))
    }
}
