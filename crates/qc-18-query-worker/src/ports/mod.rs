//! Ports Layer
//!
//! - Driving Ports (inbound) - what the dispatch loop calls
//! - Driven Ports (outbound) - transport and node collaborators

pub mod inbound;
pub mod outbound;

pub use inbound::QueryHandler;
pub use outbound::{
    AddressInterface, BlockchainInterface, DealerSocket, FrameSender, ProtocolInterface,
    QueryInterface, TransactionPoolInterface,
};
