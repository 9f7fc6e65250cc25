//! Session client with transparent refresh-and-replay
//!
//! Callers send requests and get back either a response or a typed error.
//! An expired session is renewed behind their back: the request that hit
//! the 401 waits for the shared refresh and is then replayed once.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sessionrelay_domain::{
    ApiRequest, ApiResponse, Attempt, HttpMethod, Result, SessionError, SessionState,
};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::ports::Transport;
use crate::refresh::RefreshCoordinator;

/// Entry point for every API call
#[derive(Clone)]
pub struct SessionClient {
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
}

impl SessionClient {
    /// Wrap `transport`; refreshes go through the same transport.
    pub fn new(transport: Arc<dyn Transport>, coordinator: RefreshCoordinator) -> Self {
        Self { transport, coordinator }
    }

    /// Send `method path` with an optional JSON body.
    ///
    /// # Errors
    /// See [`SessionClient::execute`].
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        self.execute(&ApiRequest::new(method, path).with_optional_body(body)).await
    }

    /// Send a prepared request, refreshing the session and replaying once
    /// if the server answers 401.
    ///
    /// # Errors
    /// - `SessionError::RefreshFailed` when the shared refresh failed; the
    ///   session has been ended
    /// - `SessionError::Unauthorized` when the replay was rejected too, or
    ///   the path is not intercepted
    /// - any other transport error unchanged
    #[instrument(
        skip(self, request),
        fields(request_id = %request.id(), method = %request.method(), path = %request.path())
    )]
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        match self.transport.send(request, Attempt::First).await {
            Err(SessionError::Unauthorized { .. })
                if self.coordinator.intercepts(request.path()) =>
            {
                debug!("session expired, waiting for refresh");
                self.coordinator.await_refresh().await?;
                self.replay(request).await
            }
            outcome => outcome,
        }
    }

    async fn replay(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.coordinator.record_replay();
        let outcome = self.transport.send(request, Attempt::Replay).await;
        if let Err(err) = &outcome {
            if err.is_unauthorized() {
                warn!(error = %err, "request rejected again after refresh");
            }
        }
        outcome
    }

    /// GET `path` and decode the body.
    ///
    /// # Errors
    /// Request errors as in [`SessionClient::execute`], or
    /// `SessionError::Decode` if the body does not match `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(&ApiRequest::get(path)).await?.json()
    }

    /// POST `body` to `path` and decode the reply.
    ///
    /// # Errors
    /// Same as [`SessionClient::get`], plus `SessionError::InvalidInput`
    /// if `body` cannot be serialized.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::post(path).with_json(body)?).await?.json()
    }

    /// PUT `body` to `path` and decode the reply.
    ///
    /// # Errors
    /// Same as [`SessionClient::post`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::new(HttpMethod::Put, path).with_json(body)?).await?.json()
    }

    /// PATCH `body` to `path` and decode the reply.
    ///
    /// # Errors
    /// Same as [`SessionClient::post`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::new(HttpMethod::Patch, path).with_json(body)?).await?.json()
    }

    /// DELETE `path` and decode the reply.
    ///
    /// # Errors
    /// Same as [`SessionClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(&ApiRequest::new(HttpMethod::Delete, path)).await?.json()
    }

    /// DELETE `path` with a JSON body (e.g. removing one cart line).
    ///
    /// # Errors
    /// Same as [`SessionClient::post`].
    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::new(HttpMethod::Delete, path).with_json(body)?).await?.json()
    }

    /// Coordinator shared by every clone of this client.
    pub const fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Snapshot of the session.
    pub fn session(&self) -> SessionState {
        self.coordinator.session()
    }

    /// Receive every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.coordinator.subscribe()
    }
}
