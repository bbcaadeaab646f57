//! Adapters Layer
//!
//! Concrete transports implementing the outbound ports.

pub mod inproc;

pub use inproc::{InprocContext, InprocDealer, InprocService};
