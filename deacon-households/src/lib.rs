//! Deacon Households - Grouping and Enrichment
//!
//! Turns the flat contact list of a mailing list into households, attaches
//! each active contact's recent notes and picks out bulk-email recipients.

pub mod enricher;
pub mod grouper;
pub mod recipients;
pub mod sort;

pub use enricher::{EnrichmentReport, NoteEnricher, NoteSource};
pub use grouper::{group_by_family, FamilyGrouper};
pub use recipients::{care_group_of, default_care_group_of, email_recipients, recipient_addresses};
pub use sort::{sort_families, FamilySort, SortDirection, SortKey};
