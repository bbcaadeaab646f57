//! Published query command vocabulary.
//!
//! Command names are a wire contract with remote clients. They are matched
//! byte for byte and must never be renamed. Removing a handler is a protocol
//! change and goes through [`OBSOLETED`], never through a rename.

pub mod address {
    pub const SUBSCRIBE2: &str = "address.subscribe2";
    pub const UNSUBSCRIBE2: &str = "address.unsubscribe2";
}

pub mod blockchain {
    pub const FETCH_BLOCK_HEADER: &str = "blockchain.fetch_block_header";
    pub const FETCH_BLOCK_HEIGHT: &str = "blockchain.fetch_block_height";
    pub const FETCH_BLOCK_TRANSACTION_HASHES: &str = "blockchain.fetch_block_transaction_hashes";
    pub const FETCH_LAST_HEIGHT: &str = "blockchain.fetch_last_height";
    pub const FETCH_TRANSACTION: &str = "blockchain.fetch_transaction";
    pub const FETCH_TRANSACTION_INDEX: &str = "blockchain.fetch_transaction_index";
    pub const FETCH_SPEND: &str = "blockchain.fetch_spend";
    pub const FETCH_HISTORY2: &str = "blockchain.fetch_history2";
    pub const FETCH_STEALTH2: &str = "blockchain.fetch_stealth2";
    pub const FETCH_STEALTH_TRANSACTION: &str = "blockchain.fetch_stealth_transaction";
    pub const BROADCAST: &str = "blockchain.broadcast";
    pub const VALIDATE: &str = "blockchain.validate";
}

pub mod transaction_pool {
    pub const FETCH_TRANSACTION: &str = "transaction_pool.fetch_transaction";
    pub const BROADCAST: &str = "transaction_pool.broadcast";
    pub const VALIDATE2: &str = "transaction_pool.validate2";
}

pub mod protocol {
    pub const TOTAL_CONNECTIONS: &str = "protocol.total_connections";
}

/// Every command the query interface answers, in attachment order.
pub const PUBLISHED: &[&str] = &[
    address::SUBSCRIBE2,
    address::UNSUBSCRIBE2,
    blockchain::FETCH_BLOCK_HEADER,
    blockchain::FETCH_BLOCK_HEIGHT,
    blockchain::FETCH_BLOCK_TRANSACTION_HASHES,
    blockchain::FETCH_LAST_HEIGHT,
    blockchain::FETCH_TRANSACTION,
    blockchain::FETCH_TRANSACTION_INDEX,
    blockchain::FETCH_SPEND,
    blockchain::FETCH_HISTORY2,
    blockchain::FETCH_STEALTH2,
    blockchain::FETCH_STEALTH_TRANSACTION,
    blockchain::BROADCAST,
    blockchain::VALIDATE,
    transaction_pool::FETCH_TRANSACTION,
    transaction_pool::BROADCAST,
    transaction_pool::VALIDATE2,
    protocol::TOTAL_CONNECTIONS,
];

/// A command retired from the protocol.
///
/// Obsoleted commands are never registered, so clients still sending them get
/// `NotFound` instead of behavior from a different handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObsoletedCommand {
    pub name: &'static str,
    /// Published command that covers the use case, if any.
    pub replacement: Option<&'static str>,
    pub reason: &'static str,
}

pub const OBSOLETED: &[ObsoletedCommand] = &[
    ObsoletedCommand {
        name: "address.renew",
        replacement: Some(address::SUBSCRIBE2),
        reason: "subscribe2 also renews",
    },
    ObsoletedCommand {
        name: "address.subscribe",
        replacement: Some(address::SUBSCRIBE2),
        reason: "superseded",
    },
    ObsoletedCommand {
        name: "address.fetch_history",
        replacement: Some(blockchain::FETCH_HISTORY2),
        reason: "unconfirmed transactions are no longer indexed",
    },
    ObsoletedCommand {
        name: "blockchain.fetch_stealth",
        replacement: Some(blockchain::FETCH_STEALTH2),
        reason: "hash byte order changed",
    },
    ObsoletedCommand {
        name: "blockchain.fetch_history",
        replacement: Some(blockchain::FETCH_HISTORY2),
        reason: "hash byte order changed",
    },
    ObsoletedCommand {
        name: "transaction_pool.validate",
        replacement: Some(transaction_pool::VALIDATE2),
        reason: "returned unconfirmed outputs",
    },
    ObsoletedCommand {
        name: "protocol.broadcast_transaction",
        replacement: Some(transaction_pool::BROADCAST),
        reason: "renamed",
    },
];

/// Whether `command` is part of the published vocabulary.
pub fn is_published(command: &str) -> bool {
    PUBLISHED.contains(&command)
}

/// Looks up the retirement record for `command`.
pub fn obsoleted(command: &str) -> Option<&'static ObsoletedCommand> {
    OBSOLETED.iter().find(|entry| entry.name == command)
}
