//! Refresh coordinator state machine
//!
//! - `Idle`: no refresh in flight.
//! - `Refreshing`: one refresh call runs on its own task; every caller that
//!   saw a 401 holds a waiter registered with that operation.
//! - `Settling`: transient, under the lock. The operation is detached from
//!   the slot, the session is updated, then the waiters are released.
//!
//! Leader election and waiter registration happen in one critical section,
//! so two callers can never both observe `Idle` and both start a refresh.
//!
//! Each operation remembers the session generation it started under. A login
//! that lands while the refresh is in flight bumps the generation, and a
//! failure of the stale refresh then leaves the newer session alone.

use std::mem;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use sessionrelay_domain::{
    ApiRequest, ApiResponse, Attempt, RefreshConfig, Result, SessionEnd, SessionError,
    SessionState, UserProfile,
};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::metrics::{RefreshMetrics, RefreshMetricsSnapshot};
use crate::ports::{SessionListener, Transport};

type Waiter = oneshot::Sender<Result<()>>;

/// Observable coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No refresh in flight
    Idle,
    /// One refresh call is running
    Refreshing {
        /// Monotonic id of the in-flight operation
        operation: u64,
        /// Callers currently suspended on it
        waiters: usize,
    },
}

struct RefreshOperation {
    id: u64,
    generation: u64,
    waiters: Vec<Waiter>,
}

enum RefreshSlot {
    Idle,
    Refreshing(RefreshOperation),
}

/// Everything guarded by the coordinator lock
struct CoordinatorState {
    slot: RefreshSlot,
    session: SessionState,
    /// Bumped whenever a session is established outside of refresh
    generation: u64,
}

enum Role {
    Leader(u64),
    Follower,
}

struct Shared {
    transport: Arc<dyn Transport>,
    config: RefreshConfig,
    state: Mutex<CoordinatorState>,
    session_tx: watch::Sender<SessionState>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
    metrics: RefreshMetrics,
    next_operation: AtomicU64,
}

/// Serializes refresh attempts and fans their outcome out to every caller
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    shared: Arc<Shared>,
}

impl RefreshCoordinator {
    /// Create a coordinator that refreshes through `transport`.
    pub fn new(transport: Arc<dyn Transport>, config: RefreshConfig) -> Self {
        let (session_tx, _) = watch::channel(SessionState::anonymous());
        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                state: Mutex::new(CoordinatorState {
                    slot: RefreshSlot::Idle,
                    session: SessionState::anonymous(),
                    generation: 0,
                }),
                session_tx,
                listeners: RwLock::new(Vec::new()),
                metrics: RefreshMetrics::default(),
                next_operation: AtomicU64::new(1),
            }),
        }
    }

    /// Join the in-flight refresh, or start one if none is running.
    ///
    /// Resolves once the shared refresh settles. Every caller of the same
    /// operation observes the same outcome.
    ///
    /// # Errors
    /// Returns `SessionError::RefreshFailed` carrying the refresh call's
    /// error. The session has already been ended when this returns.
    pub async fn await_refresh(&self) -> Result<()> {
        let (receiver, role) = self.join();

        if let Role::Leader(operation) = role {
            // Runs detached so an abandoned leader cannot strand followers.
            tokio::spawn(Arc::clone(&self.shared).drive(operation));
        }

        receiver.await.unwrap_or_else(|_| {
            Err(SessionError::Internal("refresh task ended without settling".into()))
        })
    }

    fn join(&self) -> (oneshot::Receiver<Result<()>>, Role) {
        let (tx, rx) = oneshot::channel();
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let role = match &mut state.slot {
            RefreshSlot::Refreshing(operation) => {
                operation.waiters.push(tx);
                debug!(operation = operation.id, "joining in-flight session refresh");
                Role::Follower
            }
            RefreshSlot::Idle => {
                let id = self.shared.next_operation.fetch_add(1, Ordering::Relaxed);
                state.slot = RefreshSlot::Refreshing(RefreshOperation {
                    id,
                    generation: state.generation,
                    waiters: vec![tx],
                });
                Role::Leader(id)
            }
        };
        drop(guard);

        self.shared.metrics.record_waiter();
        (rx, role)
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> RefreshPhase {
        match &self.shared.state.lock().slot {
            RefreshSlot::Idle => RefreshPhase::Idle,
            RefreshSlot::Refreshing(operation) => RefreshPhase::Refreshing {
                operation: operation.id,
                waiters: operation.waiters.len(),
            },
        }
    }

    /// Snapshot of the session.
    pub fn session(&self) -> SessionState {
        self.shared.state.lock().session.clone()
    }

    /// Whether the client currently holds a live session.
    pub fn is_authenticated(&self) -> bool {
        self.shared.state.lock().session.authenticated
    }

    /// Receive every session change (login, refresh, logout).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.session_tx.subscribe()
    }

    /// Register a consumer of the logout side effect.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.shared.listeners.write().push(listener);
    }

    /// Record a session established outside of refresh (login, profile check).
    pub fn mark_authenticated(&self, user: Option<UserProfile>) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.session = state.session.renewed(user);
        self.shared.session_tx.send_replace(state.session.clone());
    }

    /// End the session and notify listeners.
    pub fn end_session(&self, end: &SessionEnd) {
        self.shared.update_session(|_| SessionState::anonymous());
        self.shared.notify_ended(end);
    }

    /// Forget the cached identity without firing the logout side effect.
    pub fn clear_identity(&self) {
        self.shared.update_session(|_| SessionState::anonymous());
    }

    /// Whether a 401 on `path` is eligible for refresh-and-replay.
    pub fn intercepts(&self, path: &str) -> bool {
        self.shared.config.intercepts(path)
    }

    /// Paths and policy this coordinator was built with.
    pub fn config(&self) -> &RefreshConfig {
        &self.shared.config
    }

    /// Point-in-time copy of the refresh counters.
    pub fn metrics(&self) -> RefreshMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub(crate) fn record_replay(&self) {
        self.shared.metrics.record_replay();
    }
}

impl Shared {
    async fn drive(self: Arc<Self>, operation: u64) {
        self.metrics.record_started();
        info!(operation, path = %self.config.refresh_path, "refreshing session");

        let request = ApiRequest::post(self.config.refresh_path.clone());
        let outcome = AssertUnwindSafe(self.transport.send(&request, Attempt::First))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(SessionError::Internal("refresh call panicked".into())));

        match outcome {
            Ok(response) => self.settle_success(operation, &response),
            Err(cause) => {
                let error = SessionError::refresh_failed(cause);
                let ended = self.settle_failure(operation, &error);
                if ended && self.config.logout_on_refresh_failure {
                    self.server_logout().await;
                }
            }
        }
    }

    fn settle_success(&self, operation: u64, response: &ApiResponse) {
        let user = response
            .body
            .get("user")
            .cloned()
            .and_then(|value| serde_json::from_value::<UserProfile>(value).ok());

        let waiters = {
            let mut state = self.state.lock();
            let waiters =
                take_operation(&mut state.slot, operation).map_or_else(Vec::new, |op| op.waiters);
            state.session = state.session.renewed(user);
            self.session_tx.send_replace(state.session.clone());
            waiters
        };

        self.metrics.record_succeeded();
        info!(
            operation,
            waiters = waiters.len(),
            "session refreshed, replaying suspended requests"
        );

        for waiter in waiters {
            let _ = waiter.send(Ok(()));
        }
    }

    /// Release waiters with `error`. Returns whether the session was ended,
    /// which is skipped when a newer login replaced it mid-refresh.
    fn settle_failure(&self, operation: u64, error: &SessionError) -> bool {
        let (waiters, superseded) = {
            let mut state = self.state.lock();
            let (waiters, generation) = match take_operation(&mut state.slot, operation) {
                Some(detached) => (detached.waiters, detached.generation),
                None => (Vec::new(), state.generation),
            };
            let superseded = generation != state.generation;
            if !superseded {
                state.session = SessionState::anonymous();
                self.session_tx.send_replace(state.session.clone());
            }
            (waiters, superseded)
        };

        self.metrics.record_failed();
        if superseded {
            warn!(
                operation,
                waiters = waiters.len(),
                error = %error,
                "session refresh failed after a newer login, keeping session"
            );
        } else {
            warn!(
                operation,
                waiters = waiters.len(),
                error = %error,
                "session refresh failed, ending session"
            );
            self.notify_ended(&SessionEnd::RefreshFailed(error.clone()));
        }

        for waiter in waiters {
            let _ = waiter.send(Err(error.clone()));
        }
        !superseded
    }

    async fn server_logout(&self) {
        let request = ApiRequest::post(self.config.logout_path.clone());
        match self.transport.send(&request, Attempt::First).await {
            Ok(_) => debug!("server session cleared after failed refresh"),
            Err(err) => debug!(error = %err, "server logout after failed refresh was rejected"),
        }
    }

    fn update_session(&self, update: impl FnOnce(&SessionState) -> SessionState) {
        let mut state = self.state.lock();
        state.session = update(&state.session);
        self.session_tx.send_replace(state.session.clone());
    }

    fn notify_ended(&self, end: &SessionEnd) {
        self.metrics.record_session_ended();
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_session_ended(end);
        }
    }
}

/// Detach the operation from the slot, leaving it `Idle`.
fn take_operation(slot: &mut RefreshSlot, operation: u64) -> Option<RefreshOperation> {
    match mem::replace(slot, RefreshSlot::Idle) {
        RefreshSlot::Refreshing(current) if current.id == operation => Some(current),
        other => {
            *slot = other;
            None
        }
    }
}
