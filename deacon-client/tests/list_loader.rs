//! List loading through the optimistic cache.

use deacon_client::ListLoader;
use deacon_storage::{KeyValueStore, OptimisticCache};
use deacon_test_utils::*;
use std::sync::Arc;

fn loader(remote: ScriptedRemote, store: Arc<InMemoryStore>) -> ListLoader<ScriptedRemote> {
    ListLoader::new(Arc::new(remote), OptimisticCache::with_store(store))
}

fn scripted() -> ScriptedRemote {
    ScriptedRemote::new()
        .with_list("list-1", sample_contacts())
        .with_notes(
            "parent1",
            vec![simple_note("n1", "2024-01-02T00:00:00Z", "Visited after surgery")],
        )
}

#[tokio::test]
async fn first_load_is_empty_then_cached() {
    let store = Arc::new(InMemoryStore::new());
    let loader = loader(scripted(), store.clone());
    let list_id = ContactListId::new("list-1");

    let first = loader.load(&list_id);
    assert!(first.optimistic.is_none());
    let fresh = first.fetched.await.unwrap();
    assert_eq!(fresh.len(), 3);
    let smiths = fresh.get(&HouseholdId::new("household-1")).unwrap();
    assert_eq!(smiths.parents[0].notes.as_ref().map(Vec::len), Some(1));

    let second = loader.load(&list_id);
    assert_eq!(second.optimistic.as_ref(), Some(&fresh));
    second.fetched.await.unwrap();

    assert!(store.get("cache:contacts-list-list-1").unwrap().is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_households() {
    let store = Arc::new(InMemoryStore::new());
    let list_id = ContactListId::new("list-1");

    let fresh = loader(scripted(), store.clone())
        .load(&list_id)
        .fetched
        .await
        .unwrap();

    let broken = loader(ScriptedRemote::new().failing_list("list-1"), store);
    let read = broken.load(&list_id);
    assert_eq!(read.optimistic, Some(fresh.clone()));
    assert!(read.fetched.await.is_err());

    let again = broken.load(&list_id);
    assert_eq!(again.optimistic, Some(fresh));
    assert!(again.fetched.await.is_err());
}

#[tokio::test]
async fn notes_are_cached_per_contact() {
    let store = Arc::new(InMemoryStore::new());
    let loader = loader(scripted(), store.clone());
    let contact_id = ContactId::new("parent1");

    let first = loader.load_notes(&contact_id);
    assert!(first.optimistic.is_none());
    assert_eq!(first.fetched.await.unwrap().len(), 1);

    let second = loader.load_notes(&contact_id);
    assert_eq!(second.optimistic.map(|notes| notes.len()), Some(1));
    second.fetched.await.unwrap();
    assert!(store.get("cache:notes:parent1").unwrap().is_some());
}

#[tokio::test]
async fn email_contacts_filters_list_members() {
    let loader = loader(scripted(), Arc::new(InMemoryStore::new()));
    let contacts = loader
        .email_contacts(&ContactListId::new("list-1"))
        .await
        .unwrap();

    let ids: Vec<&str> = contacts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["parent1", "parent2", "solo"]);
}
