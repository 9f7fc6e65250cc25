//! Account operations layered on the session client

mod service;

pub use service::SessionService;
