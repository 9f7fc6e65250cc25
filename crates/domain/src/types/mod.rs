//! Domain types and models

pub mod auth;
pub mod request;
pub mod session;

pub use auth::{AuthReply, Credentials, Registration};
pub use request::{ApiRequest, ApiResponse, Attempt, HttpMethod};
pub use session::{SessionEnd, SessionState, UserProfile};
