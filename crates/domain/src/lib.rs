//! # SessionRelay Domain
//!
//! Data types shared by every SessionRelay crate.
//!
//! This crate contains:
//! - The typed error value returned to callers (`SessionError`)
//! - Immutable request/response records and the replay marker
//! - Session and user identity types
//! - Client configuration structures and endpoint constants
//!
//! ## Architecture
//! - No dependencies on other SessionRelay crates
//! - No I/O; pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
