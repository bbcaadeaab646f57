//! Query worker: connect, poll, dispatch, drain.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{QueryServiceSettings, Security};
use crate::domain::{WorkerEvent, WorkerState};
use crate::error::{TransportError, WorkerError};
use crate::ports::{DealerSocket, FrameSender};
use crate::registry::HandlerRegistry;
use crate::service::dispatcher::Dispatcher;
use crate::service::stats::{WorkerStats, WorkerStatsSnapshot};

/// Cooperative stop request shared between a worker and its supervisor.
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<watch::Sender<bool>>);

impl StopSignal {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self(Arc::new(sender))
    }

    /// Ask the worker to stop. Idempotent.
    pub fn stop(&self) {
        self.0.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

/// Result of one readiness poll.
enum Readiness {
    Readable,
    Terminated,
}

/// Terminates one dealer session and dispatches its queries.
///
/// One worker per channel. All dispatch happens on the task running
/// [`QueryWorker::run`]; handlers may finish their work anywhere.
pub struct QueryWorker<S> {
    socket: S,
    endpoint: String,
    security: Security,
    dispatcher: Dispatcher,
    stats: Arc<WorkerStats>,
    stop: StopSignal,
    stop_rx: watch::Receiver<bool>,
    state: watch::Sender<WorkerState>,
}

impl<S: DealerSocket> QueryWorker<S> {
    pub fn new(
        socket: S,
        registry: Arc<HandlerRegistry>,
        settings: &QueryServiceSettings,
        security: Security,
    ) -> Self {
        let stats = Arc::new(WorkerStats::new());
        let stop = StopSignal::new();
        let stop_rx = stop.subscribe();
        let (state, _) = watch::channel(WorkerState::Idle);

        Self {
            socket,
            endpoint: settings.endpoint(security).to_string(),
            security,
            dispatcher: Dispatcher::new(registry, settings, security, Arc::clone(&stats)),
            stats,
            stop,
            stop_rx,
            state,
        }
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Receiver of lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Run the worker on its own task.
    pub fn spawn(self) -> WorkerHandle
    where
        S: 'static,
    {
        let stop = self.stop_signal();
        let state = self.state();
        let stats = self.stats();
        let task = tokio::spawn(self.run());

        WorkerHandle {
            stop,
            state,
            stats,
            task,
        }
    }

    /// Connect, dispatch until stopped, then disconnect.
    ///
    /// A connect failure skips the loop entirely. Nothing received from the
    /// channel can make this return early.
    pub async fn run(mut self) -> Result<(), WorkerError> {
        if let Err(source) = self.socket.connect(&self.endpoint).await {
            error!(
                security = %self.security,
                endpoint = %self.endpoint,
                error = %source,
                "Failed to connect query worker"
            );
            self.transition(WorkerEvent::ConnectFailed);
            return Err(WorkerError::Connect {
                security: self.security,
                endpoint: self.endpoint,
                source,
            });
        }

        info!(
            security = %self.security,
            endpoint = %self.endpoint,
            "Connected query worker"
        );
        self.transition(WorkerEvent::Connected);

        let sender = self.socket.sender();
        while !self.stopped() {
            match self.poll().await {
                Readiness::Readable => self.query(&sender),
                Readiness::Terminated => break,
            }
        }

        self.transition(WorkerEvent::StopObserved);
        let result = match self.socket.disconnect().await {
            Ok(()) => Ok(()),
            Err(source) => {
                error!(
                    security = %self.security,
                    error = %source,
                    "Failed to disconnect query worker"
                );
                Err(WorkerError::Disconnect {
                    security: self.security,
                    source,
                })
            }
        };
        self.transition(WorkerEvent::Disconnected);
        result
    }

    fn stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Wait for a readable endpoint or a stop request, stop first.
    async fn poll(&mut self) -> Readiness {
        tokio::select! {
            biased;
            _ = self.stop_rx.changed() => Readiness::Terminated,
            readable = self.socket.readable() => match readable {
                Ok(()) => Readiness::Readable,
                Err(TransportError::ServiceStopped) => Readiness::Terminated,
                Err(error) => {
                    warn!(
                        security = %self.security,
                        error = %error,
                        "Query worker poller terminated"
                    );
                    Readiness::Terminated
                }
            },
        }
    }

    fn query(&mut self, sender: &Arc<dyn FrameSender>) {
        // Stop may have landed while the poll completed.
        if self.stopped() {
            return;
        }

        match self.socket.receive() {
            Err(TransportError::WouldBlock) => {}
            received => {
                self.dispatcher.dispatch(received, sender);
            }
        }
    }

    fn transition(&self, event: WorkerEvent) {
        let current = *self.state.borrow();
        if let Ok(next) = current.on(event) {
            self.state.send_replace(next);
        }
    }
}

/// Supervisor's handle to a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    stop: StopSignal,
    state: watch::Receiver<WorkerState>,
    stats: Arc<WorkerStats>,
    task: JoinHandle<Result<(), WorkerError>>,
}

impl WorkerHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Receiver of lifecycle state changes.
    pub fn state_changes(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait for the worker task to finish.
    pub async fn join(self) -> Result<(), WorkerError> {
        self.task
            .await
            .map_err(|e| WorkerError::Join(e.to_string()))?
    }

    /// Stop the worker and wait for it to drain.
    pub async fn shutdown(self) -> Result<(), WorkerError> {
        self.stop();
        self.join().await
    }
}
