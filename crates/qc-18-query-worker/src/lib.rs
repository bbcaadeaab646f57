//! # QC-18 Query Worker
//!
//! Dealer-mode command dispatch for the secure and public query services.
//!
//! A query worker terminates one duplex channel, decodes each inbound
//! request envelope, routes it by command name to a registered handler and
//! sends the correlated response back over the same channel. Handlers may
//! answer immediately or later from another task, so one worker interleaves
//! many in-flight queries.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure envelope and lifecycle logic, no I/O
//!   - `Request`, `Response`, `Status`, `FailureCode`: the envelope and its wire layout
//!   - `commands`: published and obsoleted command vocabulary
//!   - `WorkerState`: idle → running → draining → stopped
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `QueryHandler`: Driving port (one command)
//!   - `DealerSocket`, `FrameSender`: Driven ports (transport)
//!   - `AddressInterface`, `BlockchainInterface`, `TransactionPoolInterface`,
//!     `ProtocolInterface`: Driven ports (node collaborators)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `QueryWorker`: connect, poll, dispatch, drain
//!   - `Dispatcher`: one receive → one handler invocation or error response
//!   - `Responder`: owned, single-use response emitter
//!
//! - **Adapters Layer** (`adapters/`): Transports
//!   - `InprocDealer`: in-process dealer endpoint
//!
//! ## Error Handling
//!
//! Nothing a client sends can stop a worker. Malformed requests are answered
//! with `BadStream`, unknown or obsoleted commands with `NotFound`. A
//! `ServiceStopped` transport error is the expected result of racing
//! shutdown and is never logged.
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_18_query_worker::{
//!     attach_interface, HandlerRegistry, InprocContext, InprocDealer,
//!     QueryServiceSettings, QueryWorker, Security,
//! };
//! use std::sync::Arc;
//!
//! let settings = QueryServiceSettings::from_env();
//! settings.validate()?;
//!
//! let mut registry = HandlerRegistry::new();
//! attach_interface(&mut registry, Arc::new(node));
//! let registry = Arc::new(registry);
//!
//! let context = InprocContext::new();
//! let handles: Vec<_> = [Security::Secure, Security::Public]
//!     .into_iter()
//!     .map(|security| {
//!         let dealer = InprocDealer::new(&context);
//!         QueryWorker::new(dealer, Arc::clone(&registry), &settings, security).spawn()
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.shutdown().await?;
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod interface;
pub mod ports;
pub mod registry;
pub mod service;
pub mod telemetry;

// Re-exports for convenience
pub use adapters::{InprocContext, InprocDealer, InprocService};
pub use config::{QueryServiceSettings, Security};
pub use domain::{FailureCode, Frames, MalformedRequest, Request, Response, Route, Status, WorkerState};
pub use error::{ConfigError, DecodeError, TelemetryError, TransportError, WorkerError};
pub use interface::{attach_interface, bind, interface_bindings};
pub use ports::{
    AddressInterface, BlockchainInterface, DealerSocket, FrameSender, ProtocolInterface,
    QueryHandler, QueryInterface, TransactionPoolInterface,
};
pub use registry::HandlerRegistry;
pub use service::{
    DispatchOutcome, Dispatcher, QueryWorker, Responder, StopSignal, WorkerHandle, WorkerStats,
    WorkerStatsSnapshot,
};
pub use telemetry::{init_logging, LogConfig};
