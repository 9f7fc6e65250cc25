//! Login, signup, logout and profile checks
//!
//! Every call goes through [`SessionClient`], so an expired session met by
//! `check_auth` or `logout` is refreshed like any other request.

use sessionrelay_domain::constants::{LOGIN_PATH, PROFILE_PATH, SIGNUP_PATH};
use sessionrelay_domain::{
    ApiRequest, AuthReply, Credentials, ErrorKind, Registration, Result, SessionEnd, SessionError,
    UserProfile,
};
use tracing::{debug, info, instrument, warn};

use crate::client::SessionClient;

/// High-level account operations
#[derive(Clone)]
pub struct SessionService {
    client: SessionClient,
}

impl SessionService {
    /// Wrap `client`.
    pub const fn new(client: SessionClient) -> Self {
        Self { client }
    }

    /// Underlying client, for non-auth requests.
    pub const fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Log in with email and password.
    ///
    /// # Errors
    /// `SessionError::Unauthorized` for wrong credentials (never refreshed),
    /// or any transport error.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthReply> {
        let reply: AuthReply = self.client.post(LOGIN_PATH, credentials).await?;
        self.client.coordinator().mark_authenticated(reply.user.clone());
        info!("logged in");
        Ok(reply)
    }

    /// Create an account and start its session.
    ///
    /// # Errors
    /// `SessionError::InvalidInput` if the two passwords differ; nothing is
    /// sent in that case.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn signup(&self, registration: &Registration) -> Result<AuthReply> {
        if !registration.passwords_match() {
            return Err(SessionError::InvalidInput("Passwords do not match".into()));
        }

        let reply: AuthReply = self.client.post(SIGNUP_PATH, registration).await?;
        self.client.coordinator().mark_authenticated(reply.user.clone());
        info!("account created");
        Ok(reply)
    }

    /// Ask the server who is logged in.
    ///
    /// Returns `Ok(None)` when there is no valid session. Any failure clears
    /// the cached identity.
    ///
    /// # Errors
    /// Failures other than authentication (network, 5xx, decode).
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> Result<Option<UserProfile>> {
        let coordinator = self.client.coordinator();
        match self.client.get::<AuthReply>(PROFILE_PATH).await {
            Ok(AuthReply { user: Some(user), .. }) => {
                coordinator.mark_authenticated(Some(user.clone()));
                debug!(user_id = %user.id, "session is valid");
                Ok(Some(user))
            }
            Ok(AuthReply { user: None, .. }) => {
                coordinator.clear_identity();
                Ok(None)
            }
            Err(err) => {
                coordinator.clear_identity();
                match err.kind() {
                    ErrorKind::Unauthorized | ErrorKind::RefreshFailed => {
                        debug!(error = %err, "no valid session");
                        Ok(None)
                    }
                    _ => Err(err),
                }
            }
        }
    }

    /// Log out on the server, then end the local session.
    ///
    /// # Errors
    /// Any request error; the local session is left untouched in that case.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<AuthReply> {
        let coordinator = self.client.coordinator();
        let path = coordinator.config().logout_path.clone();

        let reply = match self.client.execute(&ApiRequest::post(path)).await {
            Ok(response) => response.json::<Option<AuthReply>>()?.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "logout failed");
                return Err(err);
            }
        };

        coordinator.end_session(&SessionEnd::LoggedOut);
        info!("logged out");
        Ok(reply)
    }

    /// Refresh the session now, joining a refresh already in flight.
    ///
    /// # Errors
    /// `SessionError::RefreshFailed`; the session has ended.
    pub async fn refresh(&self) -> Result<()> {
        self.client.coordinator().await_refresh().await
    }

    /// Cached identity from the last auth exchange.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.client.session().user
    }

    /// Whether the client currently holds a live session.
    pub fn is_authenticated(&self) -> bool {
        self.client.coordinator().is_authenticated()
    }
}
