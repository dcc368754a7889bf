//! Deacon Client - Remote Access and Bulk Writes
//!
//! The remote seams ([`ContactSource`], [`NoteSource`], [`ConnectionSink`]),
//! their HTTP implementation [`RestClient`], the bounded retry combinator,
//! the [`BulkConnectionWriter`] and the [`ListLoader`] pipeline.

pub mod bulk;
pub mod loader;
pub mod remote;
pub mod rest;
pub mod retry;
pub mod telemetry;

pub use bulk::{partition, BulkConnectionWriter, BulkOutcome};
pub use loader::ListLoader;
pub use remote::{ConnectionSink, ContactSource, NoteSource, Remote};
pub use rest::RestClient;
pub use retry::{retry_with_policy, Backoff, RetryPolicy};
pub use telemetry::{init_tracing, LogFormat};
