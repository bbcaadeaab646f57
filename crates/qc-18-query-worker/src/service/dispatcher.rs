//! One dispatch cycle: decode, route, invoke.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{QueryServiceSettings, Security};
use crate::domain::{Frames, MalformedRequest, Request, Response};
use crate::error::TransportError;
use crate::ports::FrameSender;
use crate::registry::HandlerRegistry;
use crate::service::responder::{send_response, LogContext, Responder};
use crate::service::stats::WorkerStats;

/// What a dispatch cycle did with one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The endpoint was torn down during the read.
    Stopped,
    /// Answered with `BadStream`.
    Malformed,
    /// Answered with `NotFound`.
    NotFound,
    /// Handed to a handler.
    Dispatched,
}

/// Routes received messages to handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    verbose: bool,
    log: LogContext,
    stats: Arc<WorkerStats>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        settings: &QueryServiceSettings,
        security: Security,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            registry,
            verbose: settings.verbose,
            log: LogContext {
                security,
                redact_routes: settings.redact_routes,
            },
            stats,
        }
    }

    /// Handle the result of one receive.
    ///
    /// Never waits on the handler. Replies for rejected messages go out on
    /// `sender` before this returns.
    pub fn dispatch(
        &self,
        received: Result<Frames, TransportError>,
        sender: &Arc<dyn FrameSender>,
    ) -> DispatchOutcome {
        if matches!(received, Err(TransportError::ServiceStopped)) {
            return DispatchOutcome::Stopped;
        }
        self.stats.record_received();

        let frames = match received {
            Ok(frames) => frames,
            Err(error) => return self.reject(MalformedRequest::unreadable(error), sender),
        };

        let request = match Request::decode(frames, self.log.security) {
            Ok(request) => request,
            Err(malformed) => return self.reject(malformed, sender),
        };

        let Some(handler) = self.registry.lookup(request.command()) else {
            debug!(
                security = %self.log.security,
                route = %self.log.route(request.route()),
                command = request.command(),
                "Invalid query command"
            );
            self.stats.record_not_found();
            let response = Response::not_found(&request);
            send_response(sender.as_ref(), &response, &self.log, &self.stats);
            return DispatchOutcome::NotFound;
        };

        if self.verbose {
            info!(
                security = %self.log.security,
                route = %self.log.route(request.route()),
                command = request.command(),
                "Query"
            );
        }

        self.stats.record_dispatched();
        let responder = Responder::bound(Arc::clone(sender), self.log, Arc::clone(&self.stats));
        handler.handle(request, responder);
        DispatchOutcome::Dispatched
    }

    fn reject(&self, malformed: MalformedRequest, sender: &Arc<dyn FrameSender>) -> DispatchOutcome {
        debug!(
            security = %self.log.security,
            route = %self.log.route(malformed.route()),
            error = %malformed.error(),
            "Failed to receive query"
        );
        self.stats.record_malformed();
        let response = Response::malformed(&malformed);
        send_response(sender.as_ref(), &response, &self.log, &self.stats);
        DispatchOutcome::Malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Route, Status};
    use crate::ports::QueryHandler;
    use crate::service::test_support::{capture_logs, RecordingSender};
    use parking_lot::Mutex;

    fn echo() -> Arc<dyn QueryHandler> {
        Arc::new(|request: Request, responder: Responder| {
            let body = request.body().clone();
            responder.send(Response::success(&request, body));
        })
    }

    fn dispatcher(verbose: bool, redact_routes: bool) -> Dispatcher {
        let registry = HandlerRegistry::from_bindings([("echo.ping", echo())]);
        let settings = QueryServiceSettings {
            verbose,
            redact_routes,
            ..Default::default()
        };
        Dispatcher::new(
            Arc::new(registry),
            &settings,
            Security::Public,
            Arc::new(WorkerStats::new()),
        )
    }

    fn setup() -> (Arc<RecordingSender>, Arc<dyn FrameSender>) {
        let recorder = Arc::new(RecordingSender::new());
        let sender: Arc<dyn FrameSender> = recorder.clone();
        (recorder, sender)
    }

    fn request(command: &str, id: u32) -> Frames {
        Request::new(Route::new("peer"), command, id, "x", Security::Public).encode()
    }

    #[test]
    fn test_ping_is_echoed() {
        let (recorder, sender) = setup();
        let dispatcher = dispatcher(false, false);

        let outcome = dispatcher.dispatch(Ok(request("echo.ping", 11)), &sender);

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        let responses = recorder.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), Status::Success);
        assert_eq!(responses[0].body().as_ref(), b"x");
        assert_eq!(responses[0].correlation_id(), 11);
        assert_eq!(responses[0].route().as_bytes(), b"peer");
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let (recorder, sender) = setup();
        let dispatcher = dispatcher(false, false);

        let outcome = dispatcher.dispatch(Ok(request("echo.pong", 2)), &sender);

        assert_eq!(outcome, DispatchOutcome::NotFound);
        let responses = recorder.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), Status::NotFound);
        assert_eq!(responses[0].command(), "echo.pong");
        assert!(responses[0].body().is_empty());
        assert_eq!(dispatcher.stats.snapshot().not_found, 1);
    }

    #[test]
    fn test_unreadable_message_is_bad_stream() {
        let (recorder, sender) = setup();
        let dispatcher = dispatcher(false, false);

        let outcome = dispatcher.dispatch(Err(TransportError::Io("truncated".into())), &sender);

        assert_eq!(outcome, DispatchOutcome::Malformed);
        let responses = recorder.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), Status::BadStream);
        assert!(responses[0].body().is_empty());

        let stats = dispatcher.stats.snapshot();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn test_undecodable_message_is_answered_on_its_route() {
        let (recorder, sender) = setup();
        let dispatcher = dispatcher(false, false);
        let frames: Frames = vec!["peer".into(), "echo.ping".into(), "\x01".into(), "".into()];

        let logs = capture_logs(|| {
            assert_eq!(dispatcher.dispatch(Ok(frames), &sender), DispatchOutcome::Malformed);
        });

        let responses = recorder.responses();
        assert_eq!(responses[0].status(), Status::BadStream);
        assert_eq!(responses[0].route().as_bytes(), b"peer");
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("DEBUG"));
    }

    #[test]
    fn test_stopped_receive_is_silent() {
        let (recorder, sender) = setup();
        let dispatcher = dispatcher(true, false);

        let logs = capture_logs(|| {
            let outcome = dispatcher.dispatch(Err(TransportError::ServiceStopped), &sender);
            assert_eq!(outcome, DispatchOutcome::Stopped);
        });

        assert!(logs.is_empty(), "unexpected logs: {logs:?}");
        assert!(recorder.responses().is_empty());
        assert_eq!(dispatcher.stats.snapshot(), Default::default());
    }

    #[test]
    fn test_verbose_logs_command_and_route() {
        let (_recorder, sender) = setup();
        let dispatcher = dispatcher(true, false);

        let logs = capture_logs(|| {
            dispatcher.dispatch(Ok(request("echo.ping", 1)), &sender);
        });

        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("INFO"));
        assert!(logs[0].contains("echo.ping"));
        assert!(logs[0].contains(&hex::encode("peer")));
    }

    #[test]
    fn test_redacted_route_is_not_logged() {
        let (_recorder, sender) = setup();
        let dispatcher = dispatcher(true, true);

        let logs = capture_logs(|| {
            dispatcher.dispatch(Ok(request("echo.ping", 1)), &sender);
            dispatcher.dispatch(Ok(request("echo.pong", 2)), &sender);
        });

        assert_eq!(logs.len(), 2);
        for line in &logs {
            assert!(line.contains(crate::service::responder::REDACTED_ROUTE));
            assert!(!line.contains(&hex::encode("peer")));
        }
    }

    #[test]
    fn test_silent_handler_sends_nothing() {
        let (recorder, sender) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let registry = HandlerRegistry::from_bindings([(
            "echo.ping",
            Arc::new(move |request: Request, _responder: Responder| {
                record.lock().push(request.correlation_id());
            }) as Arc<dyn QueryHandler>,
        )]);
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            &QueryServiceSettings::default(),
            Security::Secure,
            Arc::new(WorkerStats::new()),
        );

        let outcome = dispatcher.dispatch(Ok(request("echo.ping", 4)), &sender);

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert_eq!(*seen.lock(), vec![4]);
        assert!(recorder.responses().is_empty());
    }
}
