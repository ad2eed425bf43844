use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for a registry
#[derive(Debug, Default)]
pub struct Metrics {
    created_total: AtomicU64,
    uploaded_total: AtomicU64,
    consumed_total: AtomicU64,
    expired_on_access_total: AtomicU64,
    swept_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_created(&self) {
        self.created_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_uploaded(&self) {
        self.uploaded_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_consumed(&self) {
        self.consumed_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_expired_on_access(&self) {
        self.expired_on_access_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_swept(&self, n: u64) {
        self.swept_total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, live_entries: usize) -> RegistryStats {
        RegistryStats {
            entries,
            live_entries,
            created_total: self.created_total.load(Ordering::Relaxed),
            uploaded_total: self.uploaded_total.load(Ordering::Relaxed),
            consumed_total: self.consumed_total.load(Ordering::Relaxed),
            expired_on_access_total: self.expired_on_access_total.load(Ordering::Relaxed),
            swept_total: self.swept_total.load(Ordering::Relaxed),
        }
    }
}

/// Registry statistics for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Entries currently held, including expired ones not yet evicted
    pub entries: usize,
    /// Entries that have not expired yet
    pub live_entries: usize,
    pub created_total: u64,
    pub uploaded_total: u64,
    pub consumed_total: u64,
    pub expired_on_access_total: u64,
    pub swept_total: u64,
}
