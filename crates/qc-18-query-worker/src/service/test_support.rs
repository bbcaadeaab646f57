//! Test doubles shared by the service tests.

use parking_lot::Mutex;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::domain::{Frames, Response};
use crate::error::TransportError;
use crate::ports::FrameSender;

/// Sender that records every message, or fails every send.
#[derive(Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<Frames>>,
    failure: Option<TransportError>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn responses(&self) -> Vec<Response> {
        self.sent
            .lock()
            .iter()
            .cloned()
            .map(|frames| Response::decode(frames).unwrap())
            .collect()
    }
}

impl FrameSender for RecordingSender {
    fn send(&self, frames: Frames) -> Result<(), TransportError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent.lock().push(frames);
        Ok(())
    }
}

/// Layer that renders each event as `LEVEL message field=value ...`.
#[derive(Clone, Default)]
struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

struct LineVisitor(String);

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, " {value:?}");
        } else {
            let _ = write!(self.0, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor(event.metadata().level().to_string());
        event.record(&mut visitor);
        self.lines.lock().push(visitor.0);
    }
}

/// Run `f` with every event at every level captured.
pub(crate) fn capture_logs(f: impl FnOnce()) -> Vec<String> {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let lines = capture.lines.lock().clone();
    lines
}

/// Events captured on the current thread until this is dropped.
///
/// For `current_thread` async tests, where the code under test is awaited
/// rather than spawned onto another thread.
pub(crate) struct ScopedLogs {
    capture: LogCapture,
    _guard: DefaultGuard,
}

impl ScopedLogs {
    pub fn lines(&self) -> Vec<String> {
        self.capture.lines.lock().clone()
    }
}

pub(crate) fn scoped_logs() -> ScopedLogs {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    ScopedLogs {
        capture,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}
