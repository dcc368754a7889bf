//! Household grouping structures
//!
//! A [`FamilyGroup`] is derived from contacts on every grouping pass and is
//! never fetched directly. [`Households`] keeps groups in first-seen order.

use crate::{Contact, ContactId, HouseholdId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A household with its parents and children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyGroup {
    pub family_id: HouseholdId,
    pub family_name: String,
    pub parents: Vec<Contact>,
    pub children: Vec<Contact>,
    /// Sub-group label derived from realm membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub care_group: Option<String>,
    /// Most recent member activity, ISO-8601. Empty when no member has any.
    pub updated: String,
    /// Most recent member creation time, ISO-8601.
    pub created: String,
}

impl FamilyGroup {
    pub fn new(family_id: HouseholdId) -> Self {
        Self {
            family_id,
            ..Default::default()
        }
    }

    /// Parents first, then children.
    pub fn members(&self) -> impl Iterator<Item = &Contact> {
        self.parents.iter().chain(self.children.iter())
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Contact> {
        self.parents.iter_mut().chain(self.children.iter_mut())
    }

    pub fn member_count(&self) -> usize {
        self.parents.len() + self.children.len()
    }

    pub fn contains(&self, contact_id: &ContactId) -> bool {
        self.members().any(|contact| &contact.id == contact_id)
    }

    pub fn member_mut(&mut self, contact_id: &ContactId) -> Option<&mut Contact> {
        self.members_mut().find(|contact| &contact.id == contact_id)
    }
}

/// Insertion-ordered map of household id to family group.
///
/// Serialized as the ordered list of groups; the lookup index is rebuilt when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FamilyGroup>", into = "Vec<FamilyGroup>")]
pub struct Households {
    groups: Vec<FamilyGroup>,
    index: HashMap<HouseholdId, usize>,
}

impl Households {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, id: &HouseholdId) -> Option<&FamilyGroup> {
        self.index.get(id).map(|&i| &self.groups[i])
    }

    pub fn get_mut(&mut self, id: &HouseholdId) -> Option<&mut FamilyGroup> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.groups[i]),
            None => None,
        }
    }

    /// The group for `id`, inserting an empty one at the end if missing.
    pub fn entry(&mut self, id: HouseholdId) -> &mut FamilyGroup {
        let next = self.groups.len();
        let i = *self.index.entry(id.clone()).or_insert(next);
        if i == next {
            self.groups.push(FamilyGroup::new(id));
        }
        &mut self.groups[i]
    }

    pub fn contains_key(&self, id: &HouseholdId) -> bool {
        self.index.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &HouseholdId> {
        self.groups.iter().map(|group| &group.family_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FamilyGroup> {
        self.groups.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FamilyGroup> {
        self.groups.iter_mut()
    }

    /// Total number of contacts across all groups.
    pub fn contact_count(&self) -> usize {
        self.groups.iter().map(FamilyGroup::member_count).sum()
    }

    /// Find the contact with `contact_id` in any group.
    pub fn contact_mut(&mut self, contact_id: &ContactId) -> Option<&mut Contact> {
        self.groups
            .iter_mut()
            .find_map(|group| group.member_mut(contact_id))
    }

    pub fn into_groups(self) -> Vec<FamilyGroup> {
        self.groups
    }
}

impl From<Vec<FamilyGroup>> for Households {
    fn from(groups: Vec<FamilyGroup>) -> Self {
        let mut households = Households::new();
        for group in groups {
            if let Some(&i) = households.index.get(&group.family_id) {
                households.groups[i] = group;
            } else {
                households
                    .index
                    .insert(group.family_id.clone(), households.groups.len());
                households.groups.push(group);
            }
        }
        households
    }
}

impl From<Households> for Vec<FamilyGroup> {
    fn from(households: Households) -> Self {
        households.groups
    }
}

impl<'a> IntoIterator for &'a Households {
    type Item = &'a FamilyGroup;
    type IntoIter = std::slice::Iter<'a, FamilyGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl IntoIterator for Households {
    type Item = FamilyGroup;
    type IntoIter = std::vec::IntoIter<FamilyGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_preserves_insertion_order() {
        let mut households = Households::new();
        households.entry(HouseholdId::new("b")).family_name = "B".to_string();
        households.entry(HouseholdId::new("a")).family_name = "A".to_string();
        households.entry(HouseholdId::new("b")).care_group = Some("x".to_string());

        let keys: Vec<&str> = households.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(households.len(), 2);
        assert_eq!(
            households.get(&HouseholdId::new("b")).unwrap().care_group.as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_households_json_round_trip_rebuilds_index() {
        let mut households = Households::new();
        let group = households.entry(HouseholdId::new("household-1"));
        group.family_name = "Doe".to_string();
        group.parents.push(Contact::new("contact-1"));

        let json = serde_json::to_string(&households).unwrap();
        assert!(json.starts_with('['));

        let back: Households = serde_json::from_str(&json).unwrap();
        assert_eq!(back, households);
        assert!(back.contains_key(&HouseholdId::new("household-1")));
        assert_eq!(back.contact_count(), 1);
    }

    #[test]
    fn test_contact_mut_finds_children() {
        let mut households = Households::new();
        households
            .entry(HouseholdId::new("h"))
            .children
            .push(Contact::new("kid"));

        assert!(households.contact_mut(&ContactId::new("kid")).is_some());
        assert!(households.contact_mut(&ContactId::new("nobody")).is_none());
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Keys come back in first-seen order with no duplicates.
            #[test]
            fn prop_entry_order_is_first_seen(keys in prop::collection::vec("[a-e]", 0..30)) {
                let mut households = Households::new();
                let mut expected: Vec<String> = Vec::new();
                for key in &keys {
                    households.entry(HouseholdId::new(key.clone()));
                    if !expected.contains(key) {
                        expected.push(key.clone());
                    }
                }

                let actual: Vec<String> = households.keys().map(|k| k.to_string()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
