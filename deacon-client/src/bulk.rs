//! Recording a bulk email as connection records.
//!
//! Contacts are split into a fixed number of batches. Batches run
//! concurrently; within a batch writes go one at a time, each retried under
//! the configured [`RetryPolicy`]. Nothing is rolled back when a write fails,
//! so a retried bulk operation may record some contacts twice.

use crate::remote::ConnectionSink;
use crate::retry::{retry_with_policy, RetryPolicy};
use deacon_core::{
    BulkWriteConfig, Connected, ConnectionType, Contact, DeaconError, DeaconResult,
    NewConnection, Timestamp, DEFAULT_BATCH_COUNT,
};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a bulk write.
///
/// Serializes as `{"success": true}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OutcomeWire", into = "OutcomeWire")]
pub enum BulkOutcome {
    Success,
    Failure { error: String },
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BulkOutcome::Success)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BulkOutcome::Success => None,
            BulkOutcome::Failure { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<OutcomeWire> for BulkOutcome {
    fn from(wire: OutcomeWire) -> Self {
        if wire.success {
            BulkOutcome::Success
        } else {
            BulkOutcome::Failure {
                error: wire.error.unwrap_or_default(),
            }
        }
    }
}

impl From<BulkOutcome> for OutcomeWire {
    fn from(outcome: BulkOutcome) -> Self {
        match outcome {
            BulkOutcome::Success => OutcomeWire {
                success: true,
                error: None,
            },
            BulkOutcome::Failure { error } => OutcomeWire {
                success: false,
                error: Some(error),
            },
        }
    }
}

/// Split `items` into at most `batch_count` contiguous batches.
///
/// Sizes differ by at most one and larger batches come first, so no batch
/// exceeds `ceil(len / batch_count)`. Empty batches are never produced.
pub fn partition<T>(items: &[T], batch_count: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    let batches = batch_count.clamp(1, items.len());
    let base = items.len() / batches;
    let extra = items.len() % batches;

    let mut result = Vec::with_capacity(batches);
    let mut start = 0;
    for index in 0..batches {
        let size = base + usize::from(index < extra);
        result.push(&items[start..start + size]);
        start += size;
    }
    result
}

/// Writes one "email sent" connection record per contact.
pub struct BulkConnectionWriter<S: ?Sized> {
    sink: Arc<S>,
    batch_count: usize,
    retry: RetryPolicy,
}

impl<S: ConnectionSink + ?Sized> BulkConnectionWriter<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            batch_count: DEFAULT_BATCH_COUNT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(sink: Arc<S>, config: &BulkWriteConfig) -> Self {
        Self::new(sink)
            .with_batch_count(config.batch_count)
            .with_retry_policy(RetryPolicy::from(&config.retry))
    }

    pub fn with_batch_count(mut self, batch_count: usize) -> Self {
        self.batch_count = batch_count.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Record that `comment` was emailed to every contact at `when`.
    ///
    /// Writes go to exactly the contacts given; filtering is the caller's
    /// job. Resolves once every batch has finished. The failure carries the
    /// message of the first write to exhaust its retries.
    pub async fn write_bulk(
        &self,
        contacts: &[Contact],
        comment: &str,
        when: Timestamp,
    ) -> BulkOutcome {
        let batches = partition(contacts, self.batch_count);
        tracing::info!(
            contacts = contacts.len(),
            batches = batches.len(),
            "Writing bulk email connections"
        );

        let mut pending: FuturesUnordered<_> = batches
            .iter()
            .enumerate()
            .map(|(index, batch)| self.write_batch(index, batch, comment, when))
            .collect();

        let mut written = 0;
        let mut first_error: Option<DeaconError> = None;
        while let Some(result) = pending.next().await {
            match result {
                Ok(count) => written += count,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => {
                tracing::info!(written, "Bulk email connections recorded");
                BulkOutcome::Success
            }
            Some(e) => {
                tracing::error!(
                    written,
                    total = contacts.len(),
                    error = %e,
                    "Bulk email connections incomplete"
                );
                BulkOutcome::Failure {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Write a batch in order, stopping at the first exhausted write.
    async fn write_batch(
        &self,
        index: usize,
        batch: &[Contact],
        comment: &str,
        when: Timestamp,
    ) -> DeaconResult<usize> {
        for (position, contact) in batch.iter().enumerate() {
            let connection = NewConnection::for_contact(
                contact,
                ConnectionType::Email,
                Connected::Yes,
                comment,
                when,
            );
            let result = retry_with_policy(&self.retry, "create_connection", || {
                self.sink.create_connection(&contact.id, &connection)
            })
            .await;

            if let Err(e) = result {
                tracing::warn!(
                    batch = index,
                    contact_id = %contact.id,
                    skipped = batch.len() - position - 1,
                    "Batch stopped after failed write"
                );
                return Err(e);
            }
        }
        Ok(batch.len())
    }
}
