//! In-memory doubles shared by the core unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sessionrelay_domain::constants::{
    LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REFRESH_PATH, SIGNUP_PATH,
};
use sessionrelay_domain::{ApiRequest, ApiResponse, Attempt, Result, SessionEnd, SessionError};
use tokio::sync::Barrier;

use crate::ports::{SessionListener, Transport};

enum RefreshOutcome {
    Renew,
    Status(u16),
    NetworkError,
    Panic,
}

/// Fake backend holding a session that may be expired
///
/// Protected paths answer 401 while the session is expired; a successful
/// refresh (or login) renews it.
pub struct MockTransport {
    expired: AtomicBool,
    refresh_outcome: RefreshOutcome,
    refresh_delay: Duration,
    first_attempt_barrier: Option<Arc<Barrier>>,
    rejected_paths: Vec<String>,
    failing_paths: Vec<(String, u16)>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    sent: Mutex<Vec<(String, Attempt)>>,
}

pub fn user_json() -> Value {
    json!({ "_id": "u-1", "name": "Ada", "email": "ada@example.com", "role": "customer" })
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            expired: AtomicBool::new(false),
            refresh_outcome: RefreshOutcome::Renew,
            refresh_delay: Duration::ZERO,
            first_attempt_barrier: None,
            rejected_paths: Vec::new(),
            failing_paths: Vec::new(),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn expired(self) -> Self {
        self.expired.store(true, Ordering::SeqCst);
        self
    }

    pub fn refresh_status(mut self, status: u16) -> Self {
        self.refresh_outcome = RefreshOutcome::Status(status);
        self
    }

    pub fn refresh_network_error(mut self) -> Self {
        self.refresh_outcome = RefreshOutcome::NetworkError;
        self
    }

    pub fn refresh_panics(mut self) -> Self {
        self.refresh_outcome = RefreshOutcome::Panic;
        self
    }

    pub fn refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Hold every first attempt until `parties` of them have arrived.
    pub fn first_attempt_barrier(mut self, parties: usize) -> Self {
        self.first_attempt_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Answer 401 on `path` even with a live session.
    pub fn reject(mut self, path: &str) -> Self {
        self.rejected_paths.push(path.to_string());
        self
    }

    /// Answer `status` on `path` regardless of the session.
    pub fn fail(mut self, path: &str, status: u16) -> Self {
        self.failing_paths.push((path.to_string(), status));
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Every (path, attempt) pair received, in arrival order.
    pub fn sent(&self) -> Vec<(String, Attempt)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, path: &str) -> Vec<Attempt> {
        self.sent.lock().iter().filter(|(p, _)| p == path).map(|(_, a)| *a).collect()
    }

    async fn refresh(&self) -> Result<ApiResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }

        match self.refresh_outcome {
            RefreshOutcome::Renew => {
                self.expired.store(false, Ordering::SeqCst);
                Ok(ApiResponse::new(200, json!({ "user": user_json() })))
            }
            RefreshOutcome::Status(status) => {
                Err(SessionError::from_status(status, Some("Refresh token expired".into())))
            }
            RefreshOutcome::NetworkError => {
                Err(SessionError::Network("connection reset by peer".into()))
            }
            RefreshOutcome::Panic => panic!("refresh handler exploded"),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest, attempt: Attempt) -> Result<ApiResponse> {
        let path = request.path();
        self.sent.lock().push((path.to_string(), attempt));

        match path {
            REFRESH_PATH => return self.refresh().await,
            LOGOUT_PATH => {
                self.logout_calls.fetch_add(1, Ordering::SeqCst);
                self.expired.store(true, Ordering::SeqCst);
                return Ok(ApiResponse::new(200, json!({ "message": "Logged out" })));
            }
            LOGIN_PATH | SIGNUP_PATH => {
                self.expired.store(false, Ordering::SeqCst);
                return Ok(ApiResponse::new(200, json!({ "user": user_json() })));
            }
            _ => {}
        }

        if attempt == Attempt::First {
            if let Some(barrier) = &self.first_attempt_barrier {
                barrier.wait().await;
            }
        }

        if let Some((_, status)) = self.failing_paths.iter().find(|(p, _)| p == path) {
            return Err(SessionError::from_status(*status, Some("Upstream failure".into())));
        }
        if self.expired.load(Ordering::SeqCst) || self.rejected_paths.iter().any(|p| p == path) {
            return Err(SessionError::from_status(401, Some("Access token expired".into())));
        }

        if path == PROFILE_PATH {
            return Ok(ApiResponse::new(200, json!({ "user": user_json() })));
        }
        Ok(ApiResponse::new(
            200,
            json!({ "path": path, "attempt": attempt.number(), "echo": request.body() }),
        ))
    }
}

/// Listener that records every session end it sees
#[derive(Default)]
pub struct RecordingListener {
    ended: Mutex<Vec<SessionEnd>>,
}

impl RecordingListener {
    pub fn ended(&self) -> Vec<SessionEnd> {
        self.ended.lock().clone()
    }
}

impl SessionListener for RecordingListener {
    fn on_session_ended(&self, end: &SessionEnd) {
        self.ended.lock().push(end.clone());
    }
}
