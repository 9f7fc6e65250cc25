//! # SessionRelay Core
//!
//! Session-keeping logic, independent of any HTTP library.
//!
//! This crate contains:
//! - Port interfaces (`Transport`, `SessionListener`)
//! - The refresh coordinator (single-flight credential refresh)
//! - The session client callers send requests through
//! - The session service (login, signup, logout, profile check)
//!
//! ## Architecture Principles
//! - Only depends on `sessionrelay-domain`
//! - No HTTP code; the wire exchange sits behind `Transport`
//! - Pure, testable coordination logic

pub mod client;
pub mod ports;
pub mod refresh;
pub mod session;

#[cfg(test)]
mod testing;

// Re-export specific items to avoid ambiguity
pub use client::SessionClient;
pub use ports::{SessionListener, Transport};
pub use refresh::{RefreshCoordinator, RefreshMetricsSnapshot, RefreshPhase};
pub use session::SessionService;
