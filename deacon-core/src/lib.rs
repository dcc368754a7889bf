//! Deacon Core - Entity Types
//!
//! Pure data structures shared by every Deacon crate: contacts, notes,
//! household groups, the error taxonomy and configuration. No I/O lives here.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod family;
pub mod format;
pub mod identity;
pub mod note;

pub use config::{
    BulkWriteConfig, CacheConfig, ClientConfig, DeaconConfig, EnrichmentConfig, RetryConfig,
};
pub use entities::{ActivityIndex, ActivityRecord, Contact, HouseholdRecord, RealmRef};
pub use enums::{Connected, ConnectionType, HouseholdRole};
pub use error::{ConfigError, DeaconError, DeaconResult, RemoteError, StoreError};
pub use family::{FamilyGroup, Households};
pub use format::format_phone_number;
pub use identity::{ContactId, ContactListId, HouseholdId, NoteId, RealmId, Timestamp};
pub use note::{
    Author, ConnectionData, ConnectionNote, NewConnection, Note, SimpleNote, SimpleNoteData,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Prefix for every optimistic cache key in the persistent store. Keeps cache
/// entries apart from unrelated stored state such as auth tokens.
pub const CACHE_PREFIX: &str = "cache:";

/// Realm title prefix identifying a care group.
pub const CARE_GROUP_PREFIX: &str = "Deacon Care Group";

/// Number of recent notes kept per contact during enrichment.
pub const NOTES_PER_CONTACT: usize = 3;

/// Default number of concurrent batches for bulk connection writes.
pub const DEFAULT_BATCH_COUNT: usize = 5;

/// Default number of retries after the first failed write.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed delay between write attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 300;

pub const DEFAULT_API_URL: &str = "https://api.fluro.io";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
