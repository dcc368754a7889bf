//! Attaching recent notes to grouped contacts.

use async_trait::async_trait;
use deacon_core::{ContactId, DeaconResult, Households, Note, NOTES_PER_CONTACT};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of a contact's notes, usually the remote API.
///
/// Notes come back newest first.
#[async_trait]
pub trait NoteSource: Send + Sync {
    async fn fetch_notes(&self, contact_id: &ContactId) -> DeaconResult<Vec<Note>>;
}

/// What happened during one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Contacts a fetch was issued for, in household order.
    pub requested: Vec<ContactId>,
    pub enriched: Vec<ContactId>,
    /// Contacts whose fetch failed; they are left without notes.
    pub failed: Vec<ContactId>,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches notes for every contact with prior activity and attaches the most
/// recent ones.
pub struct NoteEnricher<S: ?Sized> {
    source: Arc<S>,
    notes_per_contact: usize,
}

impl<S: NoteSource + ?Sized> NoteEnricher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            notes_per_contact: NOTES_PER_CONTACT,
        }
    }

    pub async fn enrich(&self, households: Households) -> Households {
        self.enrich_with_report(households).await.0
    }

    /// Enrich and report which fetches succeeded.
    ///
    /// All fetches run concurrently and every one is awaited before this
    /// returns. A failed fetch is logged and skipped; the rest still attach.
    pub async fn enrich_with_report(
        &self,
        mut households: Households,
    ) -> (Households, EnrichmentReport) {
        let mut seen = HashSet::new();
        let requested: Vec<ContactId> = households
            .iter()
            .flat_map(|group| group.members())
            .filter(|contact| contact.has_activity())
            .filter(|contact| seen.insert(contact.id.clone()))
            .map(|contact| contact.id.clone())
            .collect();

        let fetches = requested.iter().map(|contact_id| async move {
            (contact_id, self.source.fetch_notes(contact_id).await)
        });
        let results = join_all(fetches).await;

        let mut report = EnrichmentReport {
            requested: requested.clone(),
            ..Default::default()
        };

        for (contact_id, result) in results {
            match result {
                Ok(notes) => {
                    let notes = most_recent(notes, self.notes_per_contact);
                    for group in households.iter_mut() {
                        for contact in group.members_mut().filter(|c| &c.id == contact_id) {
                            contact.notes = Some(notes.clone());
                        }
                    }
                    report.enriched.push(contact_id.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        contact_id = %contact_id,
                        error = %e,
                        "Failed to fetch notes, leaving contact without notes"
                    );
                    report.failed.push(contact_id.clone());
                }
            }
        }

        tracing::debug!(
            requested = report.requested.len(),
            enriched = report.enriched.len(),
            failed = report.failed.len(),
            "Note enrichment finished"
        );

        (households, report)
    }
}

/// The first `limit` notes. The remote returns notes newest first.
fn most_recent(mut notes: Vec<Note>, limit: usize) -> Vec<Note> {
    notes.truncate(limit);
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use deacon_core::{
        ActivityRecord, Author, Contact, DeaconError, HouseholdId, NoteId, RemoteError,
        SimpleNote, SimpleNoteData,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeNotes {
        notes: HashMap<ContactId, Vec<Note>>,
        failing: HashSet<ContactId>,
        calls: Mutex<Vec<ContactId>>,
    }

    #[async_trait]
    impl NoteSource for FakeNotes {
        async fn fetch_notes(&self, contact_id: &ContactId) -> DeaconResult<Vec<Note>> {
            self.calls.lock().unwrap().push(contact_id.clone());
            if self.failing.contains(contact_id) {
                return Err(DeaconError::Remote(RemoteError::RequestFailed {
                    path: format!("/info/posts?contact={contact_id}"),
                    status: 503,
                    message: "unavailable".to_string(),
                }));
            }
            Ok(self.notes.get(contact_id).cloned().unwrap_or_default())
        }
    }

    fn note(id: &str, created: &str) -> Note {
        Note::Simple(SimpleNote {
            id: NoteId::new(id),
            created: Some(created.to_string()),
            author: Author::default(),
            data: SimpleNoteData {
                body: format!("body {id}"),
            },
        })
    }

    fn active(id: &str) -> Contact {
        let mut contact = Contact::new(id);
        contact.household_id = Some(HouseholdId::new("h1"));
        contact.posts.all.push(ActivityRecord {
            id: format!("post-{id}"),
            ..Default::default()
        });
        contact
    }

    #[tokio::test]
    async fn test_fetches_only_active_contacts_and_caps_notes() {
        let mut source = FakeNotes::default();
        source.notes.insert(
            ContactId::new("a"),
            vec![
                note("n4", "2024-04-01"),
                note("n3", "2024-03-01"),
                note("n2", "2024-02-01"),
                note("n1", "2024-01-01"),
            ],
        );
        let source = Arc::new(source);

        let mut quiet = Contact::new("quiet");
        quiet.household_id = Some(HouseholdId::new("h1"));
        let households = crate::group_by_family(vec![active("a"), quiet]);

        let enriched = NoteEnricher::new(source.clone()).enrich(households).await;

        assert_eq!(*source.calls.lock().unwrap(), vec![ContactId::new("a")]);
        let group = enriched.get(&HouseholdId::new("h1")).unwrap();
        let ids: Vec<&str> = group.parents[0]
            .notes
            .as_ref()
            .unwrap()
            .iter()
            .map(|n| n.id().as_str())
            .collect();
        assert_eq!(ids, vec!["n4", "n3", "n2"]);
        assert!(group.parents[1].notes.is_none());
    }

    #[tokio::test]
    async fn test_notes_keep_remote_order() {
        let mut undated = note("n3", "");
        if let Note::Simple(simple) = &mut undated {
            simple.created = None;
        }
        let mut source = FakeNotes::default();
        source.notes.insert(
            ContactId::new("a"),
            vec![
                undated,
                note("n2", "2024-02-01"),
                note("n1", "2024-01-01"),
                note("n0", "2023-12-01"),
            ],
        );

        let households = crate::group_by_family(vec![active("a")]);
        let enriched = NoteEnricher::new(Arc::new(source)).enrich(households).await;

        let group = enriched.get(&HouseholdId::new("h1")).unwrap();
        let ids: Vec<&str> = group.parents[0]
            .notes
            .as_ref()
            .unwrap()
            .iter()
            .map(|n| n.id().as_str())
            .collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let mut source = FakeNotes::default();
        source
            .notes
            .insert(ContactId::new("ok"), vec![note("n1", "2024-01-01")]);
        source.failing.insert(ContactId::new("broken"));
        let enricher = NoteEnricher::new(Arc::new(source));

        let households = crate::group_by_family(vec![active("ok"), active("broken")]);
        let (enriched, report) = enricher.enrich_with_report(households).await;

        assert_eq!(report.requested.len(), 2);
        assert_eq!(report.enriched, vec![ContactId::new("ok")]);
        assert_eq!(report.failed, vec![ContactId::new("broken")]);
        assert!(!report.is_complete());

        let group = enriched.get(&HouseholdId::new("h1")).unwrap();
        assert_eq!(group.parents[0].notes.as_ref().map(Vec::len), Some(1));
        assert!(group.parents[1].notes.is_none());
    }

    #[tokio::test]
    async fn test_empty_households() {
        let enricher = NoteEnricher::new(Arc::new(FakeNotes::default()));
        let (enriched, report) = enricher.enrich_with_report(Households::new()).await;
        assert!(enriched.is_empty());
        assert_eq!(report, EnrichmentReport::default());
    }
}
