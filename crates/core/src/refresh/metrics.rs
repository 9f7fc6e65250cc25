//! Counters for refresh coordination

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free counters updated by the coordinator
#[derive(Debug, Default)]
pub(crate) struct RefreshMetrics {
    refreshes_started: AtomicU64,
    refreshes_succeeded: AtomicU64,
    refreshes_failed: AtomicU64,
    waiters_joined: AtomicU64,
    replays: AtomicU64,
    sessions_ended: AtomicU64,
}

impl RefreshMetrics {
    pub(crate) fn record_started(&self) {
        self.refreshes_started.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_succeeded(&self) {
        self.refreshes_succeeded.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failed(&self) {
        self.refreshes_failed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_waiter(&self) {
        self.waiters_joined.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_replay(&self) {
        self.replays.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_session_ended(&self) {
        self.sessions_ended.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::Acquire),
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Acquire),
            refreshes_failed: self.refreshes_failed.load(Ordering::Acquire),
            waiters_joined: self.waiters_joined.load(Ordering::Acquire),
            replays: self.replays.load(Ordering::Acquire),
            sessions_ended: self.sessions_ended.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of the coordinator counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshMetricsSnapshot {
    /// Refresh calls issued to the server
    pub refreshes_started: u64,
    /// Refresh calls that renewed the session
    pub refreshes_succeeded: u64,
    /// Refresh calls that failed for any reason
    pub refreshes_failed: u64,
    /// Callers that waited on a refresh (leaders included)
    pub waiters_joined: u64,
    /// Requests reissued after a successful refresh
    pub replays: u64,
    /// Logout side effects fired (refresh failures and explicit logouts)
    pub sessions_ended: u64,
}
