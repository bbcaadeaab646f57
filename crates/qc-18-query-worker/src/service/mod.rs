//! Service Layer
//!
//! The dispatch loop and everything it hands to handlers.

pub mod dispatcher;
pub mod responder;
pub mod stats;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use responder::{Responder, REDACTED_ROUTE};
pub use stats::{WorkerStats, WorkerStatsSnapshot};
pub use worker::{QueryWorker, StopSignal, WorkerHandle};
