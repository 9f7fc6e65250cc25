//! Single-flight credential refresh
//!
//! When many in-flight requests hit an expired session at once, exactly one
//! refresh call is made; everyone else waits on its outcome.

mod coordinator;
mod metrics;

pub use coordinator::{RefreshCoordinator, RefreshPhase};
pub use metrics::RefreshMetricsSnapshot;
