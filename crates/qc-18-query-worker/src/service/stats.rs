//! Per-worker dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the dispatch loop and its responders.
#[derive(Debug, Default)]
pub struct WorkerStats {
    received: AtomicU64,
    dispatched: AtomicU64,
    malformed: AtomicU64,
    not_found: AtomicU64,
    responses_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    pub received: u64,
    pub dispatched: u64,
    pub malformed: u64,
    pub not_found: u64,
    pub responses_sent: u64,
    pub send_failures: u64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = WorkerStats::new();
        stats.record_received();
        stats.record_received();
        stats.record_not_found();
        stats.record_sent();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.responses_sent, 1);
        assert_eq!(snapshot.dispatched, 0);
    }
}
