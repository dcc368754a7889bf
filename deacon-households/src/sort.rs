//! Ordering households for display.

use deacon_core::{FamilyGroup, Households};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field households are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    FamilyName,
    Updated,
    Created,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::FamilyName => "familyName",
            SortKey::Updated => "updated",
            SortKey::Created => "created",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "familyName" => Ok(SortKey::FamilyName),
            "updated" => Ok(SortKey::Updated),
            "created" => Ok(SortKey::Created),
            other => Err(format!("Unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction: {other}")),
        }
    }
}

/// A sort key and direction. Defaults to family name, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySort {
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
}

impl FamilySort {
    pub fn new(sort_by: SortKey, sort_direction: SortDirection) -> Self {
        Self {
            sort_by,
            sort_direction,
        }
    }

    /// Selecting the active key flips the direction; selecting another key
    /// switches to it ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.sort_by == key {
            Self::new(key, self.sort_direction.reversed())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }

    fn compare(&self, a: &FamilyGroup, b: &FamilyGroup) -> Ordering {
        let ordering = match self.sort_by {
            SortKey::FamilyName => compare_names(&a.family_name, &b.family_name),
            SortKey::Updated => a.updated.cmp(&b.updated),
            SortKey::Created => a.created.cmp(&b.created),
        };
        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Case-insensitive first, then exact, so the order is total.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Households ordered by `sort`. Ties keep first-seen order.
pub fn sort_families(households: &Households, sort: FamilySort) -> Vec<&FamilyGroup> {
    let mut groups: Vec<&FamilyGroup> = households.iter().collect();
    groups.sort_by(|a, b| sort.compare(a, b));
    groups
}
