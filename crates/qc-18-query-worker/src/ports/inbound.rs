//! Inbound Ports (Driving Ports)
//!
//! The capability a command handler presents to the dispatch loop.

use crate::domain::Request;
use crate::service::Responder;

/// Handles one query command.
///
/// The handler owns `responder` and may complete it synchronously, later from
/// another task, or not at all. The dispatch loop never waits for it, so a
/// slow handler must move its work elsewhere instead of blocking here.
pub trait QueryHandler: Send + Sync {
    fn handle(&self, request: Request, responder: Responder);
}

impl<F> QueryHandler for F
where
    F: Fn(Request, Responder) + Send + Sync,
{
    fn handle(&self, request: Request, responder: Responder) {
        self(request, responder)
    }
}
