//! Cache usage counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that produced an optimistic value.
    pub hits: u64,
    /// Reads with no usable entry, including corrupt ones.
    pub misses: u64,
    /// Entries that failed to deserialize.
    pub corrupt_entries: u64,
    /// Successful writes of a fetched value.
    pub writes: u64,
    /// Fetched values that could not be written back.
    pub write_failures: u64,
    /// Fetches that resolved with an error.
    pub fetch_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared atomic counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt_entries: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    fetch_failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn corrupt(&self) {
        self.corrupt_entries.fetch_add(1, Ordering::Relaxed);
        self.miss();
    }

    pub(crate) fn write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            corrupt_entries: self.corrupt_entries.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);

        let counters = CacheCounters::default();
        counters.hit();
        counters.hit();
        counters.hit();
        counters.corrupt();

        let stats = counters.snapshot();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.corrupt_entries, 1);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
