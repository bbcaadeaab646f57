//! Command attachment.
//!
//! Binds every published command name to the node method that serves it.
//! The list below is the single place the vocabulary meets the node; obsoleted
//! names are deliberately absent.

use std::sync::Arc;

use crate::domain::commands::{address, blockchain, protocol, transaction_pool};
use crate::domain::Request;
use crate::ports::{
    AddressInterface, BlockchainInterface, ProtocolInterface, QueryHandler, QueryInterface,
    TransactionPoolInterface,
};
use crate::registry::HandlerRegistry;
use crate::service::Responder;

/// Node method taking a request and its responder.
pub type NodeMethod<N> = fn(&N, Request, Responder);

/// Curry `node` into `method`.
pub fn bind<N>(node: &Arc<N>, method: NodeMethod<N>) -> Arc<dyn QueryHandler>
where
    N: Send + Sync + 'static,
{
    let node = Arc::clone(node);
    Arc::new(move |request: Request, responder: Responder| method(&node, request, responder))
}

/// Bindings for the full query interface, in published order.
pub fn interface_bindings<N: QueryInterface>(
    node: Arc<N>,
) -> Vec<(&'static str, Arc<dyn QueryHandler>)> {
    vec![
        (address::SUBSCRIBE2, bind(&node, <N as AddressInterface>::subscribe2)),
        (address::UNSUBSCRIBE2, bind(&node, <N as AddressInterface>::unsubscribe2)),
        (
            blockchain::FETCH_BLOCK_HEADER,
            bind(&node, <N as BlockchainInterface>::fetch_block_header),
        ),
        (
            blockchain::FETCH_BLOCK_HEIGHT,
            bind(&node, <N as BlockchainInterface>::fetch_block_height),
        ),
        (
            blockchain::FETCH_BLOCK_TRANSACTION_HASHES,
            bind(&node, <N as BlockchainInterface>::fetch_block_transaction_hashes),
        ),
        (
            blockchain::FETCH_LAST_HEIGHT,
            bind(&node, <N as BlockchainInterface>::fetch_last_height),
        ),
        (
            blockchain::FETCH_TRANSACTION,
            bind(&node, <N as BlockchainInterface>::fetch_transaction),
        ),
        (
            blockchain::FETCH_TRANSACTION_INDEX,
            bind(&node, <N as BlockchainInterface>::fetch_transaction_index),
        ),
        (blockchain::FETCH_SPEND, bind(&node, <N as BlockchainInterface>::fetch_spend)),
        (
            blockchain::FETCH_HISTORY2,
            bind(&node, <N as BlockchainInterface>::fetch_history2),
        ),
        (
            blockchain::FETCH_STEALTH2,
            bind(&node, <N as BlockchainInterface>::fetch_stealth2),
        ),
        (
            blockchain::FETCH_STEALTH_TRANSACTION,
            bind(&node, <N as BlockchainInterface>::fetch_stealth_transaction),
        ),
        (blockchain::BROADCAST, bind(&node, <N as BlockchainInterface>::broadcast)),
        (blockchain::VALIDATE, bind(&node, <N as BlockchainInterface>::validate)),
        (
            transaction_pool::FETCH_TRANSACTION,
            bind(&node, <N as TransactionPoolInterface>::fetch_transaction),
        ),
        (
            transaction_pool::BROADCAST,
            bind(&node, <N as TransactionPoolInterface>::broadcast),
        ),
        (
            transaction_pool::VALIDATE2,
            bind(&node, <N as TransactionPoolInterface>::validate2),
        ),
        (
            protocol::TOTAL_CONNECTIONS,
            bind(&node, <N as ProtocolInterface>::total_connections),
        ),
    ]
}

/// Attach the full query interface of `node` to `registry`.
pub fn attach_interface<N: QueryInterface>(registry: &mut HandlerRegistry, node: Arc<N>) {
    registry.load(interface_bindings(node));
}
