//! Domain Layer
//!
//! Envelopes, the command vocabulary and the worker lifecycle. No I/O.

pub mod commands;
pub mod envelope;
pub mod state;

pub use commands::{ObsoletedCommand, OBSOLETED, PUBLISHED};
pub use envelope::{FailureCode, Frames, MalformedRequest, Request, Response, Route, Status};
pub use state::{InvalidTransition, WorkerEvent, WorkerState};
