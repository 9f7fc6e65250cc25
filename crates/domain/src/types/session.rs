//! Session and user identity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// Identity returned by the auth endpoints (`{"user": {...}}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-side id (`_id` on the wire)
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Account role, e.g. `customer` or `admin`
    #[serde(default)]
    pub role: Option<String>,
}

/// Whether the client currently holds a live session
///
/// The credential itself lives in the transport's cookie store; this is
/// only the client's view of it plus the cached identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether the last auth exchange left a live session
    pub authenticated: bool,
    /// Cached identity, if the server sent one
    pub user: Option<UserProfile>,
    /// When the session was last established or renewed
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// No session, no identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Fresh session; `user` is kept from the previous state when `None`.
    #[must_use]
    pub fn renewed(&self, user: Option<UserProfile>) -> Self {
        Self {
            authenticated: true,
            user: user.or_else(|| self.user.clone()),
            authenticated_at: Some(Utc::now()),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "error", rename_all = "snake_case")]
pub enum SessionEnd {
    /// Explicit logout requested by the application
    LoggedOut,
    /// The shared refresh operation failed with this error
    RefreshFailed(SessionError),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn user_accepts_mongo_style_id() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "64f0c2",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "customer"
        }))
        .unwrap();

        assert_eq!(user.id, "64f0c2");
        assert_eq!(user.role.as_deref(), Some("customer"));
    }

    #[test]
    fn renewed_keeps_cached_identity() {
        let user = UserProfile {
            id: "1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: None,
        };
        let state = SessionState::anonymous().renewed(Some(user.clone()));
        let refreshed = state.renewed(None);

        assert!(refreshed.authenticated);
        assert_eq!(refreshed.user, Some(user));
        assert!(refreshed.authenticated_at.is_some());
    }
}
