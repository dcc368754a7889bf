//! Enum types for Deacon entities

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

fn normalize_token(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

// ============================================================================
// HOUSEHOLD ROLE
// ============================================================================

/// Role of a contact within its household.
///
/// The remote system only distinguishes children explicitly; anything that is
/// not `"child"` (including a missing role) is treated as a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HouseholdRole {
    #[default]
    Parent,
    Child,
}

impl HouseholdRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            HouseholdRole::Parent => "parent",
            HouseholdRole::Child => "child",
        }
    }
}

impl fmt::Display for HouseholdRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HouseholdRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "parent" | "adult" | "spouse" => Ok(HouseholdRole::Parent),
            "child" | "dependant" | "dependent" => Ok(HouseholdRole::Child),
            _ => Err(format!("Invalid HouseholdRole: {}", s)),
        }
    }
}

impl Serialize for HouseholdRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HouseholdRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }
}

// ============================================================================
// CONNECTION ENUMS
// ============================================================================

/// Channel through which an outreach attempt happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    Phone,
    Email,
    Visit,
    /// Any connection type the client does not know by name.
    Other(String),
}

impl ConnectionType {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionType::Phone => "phone",
            ConnectionType::Email => "email",
            ConnectionType::Visit => "visit",
            ConnectionType::Other(value) => value,
        }
    }

    /// Human readable label, as shown next to a connection note.
    pub fn label(&self) -> &str {
        match self {
            ConnectionType::Phone => "Phone Call",
            ConnectionType::Email => "Email",
            ConnectionType::Visit => "Visit",
            ConnectionType::Other(value) => value,
        }
    }
}

impl From<String> for ConnectionType {
    fn from(value: String) -> Self {
        match normalize_token(&value).as_str() {
            "phone" | "call" | "phone_call" => ConnectionType::Phone,
            "email" => ConnectionType::Email,
            "visit" => ConnectionType::Visit,
            _ => ConnectionType::Other(value),
        }
    }
}

impl From<ConnectionType> for String {
    fn from(value: ConnectionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the outreach attempt actually reached the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connected {
    Yes,
    No,
}

impl Connected {
    pub fn is_yes(&self) -> bool {
        matches!(self, Connected::Yes)
    }
}

impl fmt::Display for Connected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Connected::Yes => "yes",
            Connected::No => "no",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Connected {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "yes" | "true" | "y" => Ok(Connected::Yes),
            "no" | "false" | "n" => Ok(Connected::No),
            _ => Err(format!("Invalid Connected: {}", s)),
        }
    }
}
