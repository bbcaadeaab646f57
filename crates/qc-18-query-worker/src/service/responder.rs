//! Response emitter handed to handlers.

use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::config::Security;
use crate::domain::{Response, Route};
use crate::error::TransportError;
use crate::ports::FrameSender;
use crate::service::stats::WorkerStats;

/// Shown in place of a route when route redaction is enabled.
pub const REDACTED_ROUTE: &str = "[redacted]";

/// Logging fields shared by the dispatch loop and its responders.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogContext {
    pub security: Security,
    pub redact_routes: bool,
}

impl LogContext {
    pub fn route(&self, route: &Route) -> String {
        if self.redact_routes {
            REDACTED_ROUTE.to_string()
        } else {
            route.to_string()
        }
    }
}

/// Continuation bound to one worker's channel.
///
/// Consumed by [`Responder::send`], so each request gets at most one reply.
/// It can be moved to any task; if that task outlives the channel the reply
/// is dropped silently.
pub struct Responder {
    sender: Arc<dyn FrameSender>,
    log: LogContext,
    stats: Arc<WorkerStats>,
}

impl Responder {
    /// Responder over an arbitrary sender, for driving handlers outside a worker.
    pub fn new(sender: Arc<dyn FrameSender>, security: Security) -> Self {
        Self::bound(
            sender,
            LogContext {
                security,
                redact_routes: false,
            },
            Arc::new(WorkerStats::new()),
        )
    }

    pub(crate) fn bound(
        sender: Arc<dyn FrameSender>,
        log: LogContext,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self { sender, log, stats }
    }

    /// Send the reply. Performs exactly one transport send.
    pub fn send(self, response: Response) {
        send_response(self.sender.as_ref(), &response, &self.log, &self.stats);
    }

    pub fn security(&self) -> Security {
        self.log.security
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("security", &self.log.security)
            .finish_non_exhaustive()
    }
}

/// Best-effort send of one response.
///
/// `ServiceStopped` means the channel was torn down under us, which is normal
/// during shutdown and not worth a log line.
pub(crate) fn send_response(
    sender: &dyn FrameSender,
    response: &Response,
    log: &LogContext,
    stats: &WorkerStats,
) {
    match sender.send(response.encode()) {
        Ok(()) => stats.record_sent(),
        Err(TransportError::ServiceStopped) => {}
        Err(error) => {
            stats.record_send_failure();
            warn!(
                security = %log.security,
                route = %log.route(response.route()),
                command = response.command(),
                error = %error,
                "Failed to send query response"
            );
        }
    }
}
