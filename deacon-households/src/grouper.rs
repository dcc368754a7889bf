//! Folding flat contact lists into households.

use deacon_core::{Contact, EnrichmentConfig, HouseholdId, Households, CARE_GROUP_PREFIX};
use std::collections::HashSet;

/// Groups contacts into [`Households`] in a single deterministic pass.
#[derive(Debug, Clone)]
pub struct FamilyGrouper {
    care_group_prefix: String,
}

impl Default for FamilyGrouper {
    fn default() -> Self {
        Self::new(CARE_GROUP_PREFIX)
    }
}

impl FamilyGrouper {
    pub fn new(care_group_prefix: impl Into<String>) -> Self {
        Self {
            care_group_prefix: care_group_prefix.into(),
        }
    }

    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(config.care_group_prefix.clone())
    }

    /// Fold `contacts` into households.
    ///
    /// Households appear in the order their first member was seen, and
    /// members keep input order within their role. Each contact lands in
    /// exactly one household: its household id, or its own id when it has
    /// none.
    ///
    /// The family name is the title of the first household record carried by
    /// any member, otherwise the last name of the first parent, even when that
    /// name is blank. The care group is taken from the first parent holding a
    /// matching realm and is never replaced afterwards.
    pub fn group(&self, contacts: impl IntoIterator<Item = Contact>) -> Households {
        let mut households = Households::new();
        let mut named_from_record: HashSet<HouseholdId> = HashSet::new();
        let mut seen_parent: HashSet<HouseholdId> = HashSet::new();

        for contact in contacts {
            let key = contact.household_key();
            let first_parent = contact.is_parent() && seen_parent.insert(key.clone());
            let group = households.entry(key.clone());

            if !named_from_record.contains(&key) {
                let record_title = contact
                    .family
                    .as_ref()
                    .map(|record| record.title.trim())
                    .filter(|title| !title.is_empty());
                if let Some(title) = record_title {
                    group.family_name = title.to_string();
                    named_from_record.insert(key);
                } else if first_parent {
                    group.family_name = contact.last_name.clone();
                }
            }

            if group.updated.as_str() < contact.last_activity() {
                group.updated = contact.last_activity().to_string();
            }
            if let Some(created) = contact.created.as_deref() {
                if group.created.as_str() < created {
                    group.created = created.to_string();
                }
            }

            if contact.is_parent() {
                if group.care_group.is_none() {
                    group.care_group = contact
                        .realm_with_prefix(&self.care_group_prefix)
                        .map(str::to_string);
                }
                group.parents.push(contact);
            } else {
                group.children.push(contact);
            }
        }

        households
    }
}

/// Group with the default care-group prefix.
pub fn group_by_family(contacts: impl IntoIterator<Item = Contact>) -> Households {
    FamilyGrouper::default().group(contacts)
}
