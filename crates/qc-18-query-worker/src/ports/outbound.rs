//! Outbound Ports (Driven Ports)
//!
//! Dependencies the worker needs from its surroundings:
//!
//! | Port | Provided by |
//! |------|-------------|
//! | `DealerSocket`, `FrameSender` | transport (see `adapters::inproc`) |
//! | `AddressInterface` | address subscription service |
//! | `BlockchainInterface` | chain queries and block relay |
//! | `TransactionPoolInterface` | mempool queries and relay |
//! | `ProtocolInterface` | peer-to-peer network state |

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Frames, Request};
use crate::error::TransportError;
use crate::service::Responder;

/// Sending half of a dealer endpoint.
///
/// Shared with every in-flight responder, so it must be usable from any task.
/// Sends never block: a message for an unreachable or overloaded peer is
/// dropped. Once the endpoint is torn down every send reports
/// [`TransportError::ServiceStopped`].
pub trait FrameSender: Send + Sync {
    fn send(&self, frames: Frames) -> Result<(), TransportError>;
}

/// Dealer-mode session to a query service.
///
/// Exclusively owned by one worker from `connect` to `disconnect`.
#[async_trait]
pub trait DealerSocket: Send {
    async fn connect(&mut self, endpoint: &str) -> Result<(), TransportError>;

    /// Wait until a message can be received.
    ///
    /// Must be cancel safe: the poller races it against the stop signal.
    /// Returns [`TransportError::ServiceStopped`] once the peer side is gone.
    async fn readable(&mut self) -> Result<(), TransportError>;

    /// Take one message without blocking.
    fn receive(&mut self) -> Result<Frames, TransportError>;

    /// Handle for sending on this session.
    fn sender(&self) -> Arc<dyn FrameSender>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// `address.*` commands.
pub trait AddressInterface: Send + Sync + 'static {
    fn subscribe2(&self, request: Request, responder: Responder);
    fn unsubscribe2(&self, request: Request, responder: Responder);
}

/// `blockchain.*` commands.
pub trait BlockchainInterface: Send + Sync + 'static {
    fn fetch_block_header(&self, request: Request, responder: Responder);
    fn fetch_block_height(&self, request: Request, responder: Responder);
    fn fetch_block_transaction_hashes(&self, request: Request, responder: Responder);
    fn fetch_last_height(&self, request: Request, responder: Responder);
    fn fetch_transaction(&self, request: Request, responder: Responder);
    fn fetch_transaction_index(&self, request: Request, responder: Responder);
    fn fetch_spend(&self, request: Request, responder: Responder);
    fn fetch_history2(&self, request: Request, responder: Responder);
    fn fetch_stealth2(&self, request: Request, responder: Responder);
    fn fetch_stealth_transaction(&self, request: Request, responder: Responder);
    fn broadcast(&self, request: Request, responder: Responder);
    fn validate(&self, request: Request, responder: Responder);
}

/// `transaction_pool.*` commands.
pub trait TransactionPoolInterface: Send + Sync + 'static {
    fn fetch_transaction(&self, request: Request, responder: Responder);
    fn broadcast(&self, request: Request, responder: Responder);
    fn validate2(&self, request: Request, responder: Responder);
}

/// `protocol.*` commands.
pub trait ProtocolInterface: Send + Sync + 'static {
    fn total_connections(&self, request: Request, responder: Responder);
}

/// A node exposing the full query interface.
pub trait QueryInterface:
    AddressInterface + BlockchainInterface + TransactionPoolInterface + ProtocolInterface
{
}

impl<T> QueryInterface for T where
    T: AddressInterface + BlockchainInterface + TransactionPoolInterface + ProtocolInterface
{
}
