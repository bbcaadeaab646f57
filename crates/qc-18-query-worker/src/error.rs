//! Error types for the Query Worker subsystem

use thiserror::Error;

use crate::config::Security;

/// Errors reported by a dealer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint was torn down while the operation was in flight.
    ///
    /// Expected during shutdown races. Never logged, never surfaced to a client.
    #[error("service stopped")]
    ServiceStopped,

    #[error("endpoint is not connected")]
    NotConnected,

    #[error("endpoint is already connected")]
    AlreadyConnected,

    #[error("no service bound at {0}")]
    EndpointNotFound(String),

    #[error("address already in use: {0}")]
    EndpointInUse(String),

    /// `receive` was called with nothing ready.
    #[error("no message ready")]
    WouldBlock,

    #[error("transport failure: {0}")]
    Io(String),
}

/// Errors decoding a multipart envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("bad frame count: {0}")]
    FrameCount(usize),

    #[error("command frame is not valid UTF-8")]
    InvalidCommand,

    #[error("correlation frame must be 4 bytes, got {0}")]
    InvalidCorrelationId(usize),

    #[error("status frame must be at least 4 bytes, got {0}")]
    InvalidStatus(usize),

    /// The transport failed before a message could be read.
    #[error("unreadable message: {0}")]
    Unreadable(TransportError),
}

/// Errors returned to whoever supervises a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect {security} query worker to {endpoint}: {source}")]
    Connect {
        security: Security,
        endpoint: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to disconnect {security} query worker: {source}")]
    Disconnect {
        security: Security,
        #[source]
        source: TransportError,
    },

    #[error("query worker task failed: {0}")]
    Join(String),
}

/// Invalid query service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} query endpoint is empty")]
    EmptyEndpoint(Security),

    #[error("secure and public query endpoints must differ: {0}")]
    SharedEndpoint(String),

    #[error("high water mark must be non-zero")]
    ZeroHighWaterMark,
}

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_names_role_and_endpoint() {
        let error = WorkerError::Connect {
            security: Security::Secure,
            endpoint: "inproc://secure_query_workers".to_string(),
            source: TransportError::EndpointNotFound("inproc://secure_query_workers".to_string()),
        };

        let message = error.to_string();
        assert!(message.contains("secure"));
        assert!(message.contains("inproc://secure_query_workers"));
    }

    #[test]
    fn test_unreadable_wraps_transport_error() {
        let error = DecodeError::Unreadable(TransportError::Io("reset".to_string()));
        assert_eq!(error.to_string(), "unreadable message: transport failure: reset");
    }
}
