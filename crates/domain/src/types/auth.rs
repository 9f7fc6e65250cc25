//! Payloads for the authentication endpoints

use serde::{Deserialize, Serialize};

use super::session::UserProfile;

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Signup form as entered by the user
///
/// `confirm_password` is checked locally and never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Must equal `password`
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

impl Registration {
    /// Whether both password fields agree.
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }
}

/// Typical reply of the auth endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    /// Logged-in user, when the endpoint returns one
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Server's human-readable status
    #[serde(default)]
    pub message: Option<String>,
}
