//! Choosing who receives a bulk email.

use deacon_core::{Contact, CARE_GROUP_PREFIX};
use std::collections::HashSet;

/// Contacts a bulk email goes to: every non-child with at least one email,
/// in input order.
pub fn email_recipients<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> Vec<Contact> {
    contacts
        .into_iter()
        .filter(|contact| !contact.is_child() && contact.has_email())
        .cloned()
        .collect()
}

/// Every non-blank address of `contacts`, first occurrence kept.
/// Addresses are compared case-insensitively.
pub fn recipient_addresses(contacts: &[Contact]) -> Vec<String> {
    let mut seen = HashSet::new();
    contacts
        .iter()
        .flat_map(|contact| contact.emails.iter())
        .map(|email| email.trim())
        .filter(|email| !email.is_empty())
        .filter(|email| seen.insert(email.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// The care group a contact belongs to, if any.
pub fn care_group_of<'a>(contact: &'a Contact, prefix: &str) -> Option<&'a str> {
    contact.realm_with_prefix(prefix)
}

/// [`care_group_of`] with the default prefix.
pub fn default_care_group_of(contact: &Contact) -> Option<&str> {
    care_group_of(contact, CARE_GROUP_PREFIX)
}
