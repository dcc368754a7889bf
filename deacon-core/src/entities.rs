//! Contact entity structures
//!
//! These mirror the shape the remote CRM returns. Every field tolerates being
//! absent or `null`; a malformed record degrades to empty values rather than
//! failing the whole list.

use crate::{ContactId, HouseholdId, HouseholdRole, Note, RealmId};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A realm membership on a contact.
///
/// Some endpoints return realms as bare id strings, others as objects with a
/// title. Both forms deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RealmRef {
    #[serde(rename = "_id")]
    pub id: RealmId,
    pub title: String,
}

impl RealmRef {
    pub fn new(id: impl Into<RealmId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl<'de> Deserialize<'de> for RealmRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RealmObject {
            #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
            id: RealmId,
            #[serde(default, deserialize_with = "null_as_default")]
            title: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RealmWire {
            Id(String),
            Object(RealmObject),
        }

        Ok(match RealmWire::deserialize(deserializer)? {
            RealmWire::Id(id) => RealmRef::new(id, String::new()),
            RealmWire::Object(obj) => RealmRef {
                id: obj.id,
                title: obj.title,
            },
        })
    }
}

/// The household record a contact is attached to, when the remote includes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdRecord {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: HouseholdId,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// A prior activity record (post) on a contact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityRecord {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub definition: Option<String>,
}

/// Activity index as delivered under `_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityIndex {
    #[serde(deserialize_with = "null_as_default")]
    pub all: Vec<ActivityRecord>,
}

/// Contact record.
///
/// Owned by the remote system; the client only ever holds a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: ContactId,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    pub preferred_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_numbers: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub emails: Vec<String>,
    #[serde(rename = "_ss_householdID")]
    pub household_id: Option<HouseholdId>,
    pub household_role: HouseholdRole,
    pub family: Option<HouseholdRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub realms: Vec<RealmRef>,
    pub created: Option<String>,
    pub updated: Option<String>,
    #[serde(rename = "_posts", deserialize_with = "null_as_default")]
    pub posts: ActivityIndex,
    /// Recent notes, attached by enrichment. `None` until loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
}

impl Contact {
    /// Create a contact with only an id; everything else empty.
    pub fn new(id: impl Into<ContactId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Preferred name if set, otherwise the first name, followed by the last name.
    pub fn display_name(&self) -> String {
        let given = self
            .preferred_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.first_name);
        format!("{} {}", given, self.last_name).trim().to_string()
    }

    /// The household this contact belongs to. Contacts without a household
    /// form their own singleton household keyed by their id.
    pub fn household_key(&self) -> HouseholdId {
        match &self.household_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.id.clone().into(),
        }
    }

    pub fn is_parent(&self) -> bool {
        self.household_role == HouseholdRole::Parent
    }

    pub fn is_child(&self) -> bool {
        self.household_role == HouseholdRole::Child
    }

    /// True when the contact has at least one prior activity record.
    pub fn has_activity(&self) -> bool {
        !self.posts.all.is_empty()
    }

    pub fn has_email(&self) -> bool {
        self.emails.iter().any(|email| !email.trim().is_empty())
    }

    /// Latest activity timestamp as an ISO-8601 string.
    ///
    /// The max `updated` across activity records, falling back to the
    /// contact's own `updated`. Absent timestamps are the empty string, which
    /// sorts below every real timestamp.
    pub fn last_activity(&self) -> &str {
        let latest_post = self
            .posts
            .all
            .iter()
            .filter_map(|post| post.updated.as_deref())
            .max();
        latest_post
            .or(self.updated.as_deref())
            .unwrap_or("")
    }

    /// Title of the first realm whose title starts with `prefix`.
    pub fn realm_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.realms
            .iter()
            .map(|realm| realm.title.as_str())
            .find(|title| title.starts_with(prefix))
    }
}
