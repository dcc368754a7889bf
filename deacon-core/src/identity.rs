//! Identity types for Deacon entities
//!
//! The remote CRM hands out opaque string identifiers. Each kind of id gets
//! its own newtype so a contact id can never be passed where a household id
//! is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a contact record.
    ContactId
);
string_id!(
    /// Identifier of a household. Contacts without one use their own id.
    HouseholdId
);
string_id!(
    /// Identifier of a note or connection record.
    NoteId
);
string_id!(
    /// Identifier of a realm (group membership tag).
    RealmId
);
string_id!(
    /// Identifier of a contact list (team) on the remote system.
    ContactListId
);

impl From<ContactId> for HouseholdId {
    fn from(value: ContactId) -> Self {
        Self(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ContactId::new("contact-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"contact-1\"");

        let back: ContactId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_contact_id_converts_to_household_id() {
        let household: HouseholdId = ContactId::from("solo").into();
        assert_eq!(household.as_str(), "solo");
    }

    #[test]
    fn test_empty_default() {
        assert!(HouseholdId::default().is_empty());
    }
}
