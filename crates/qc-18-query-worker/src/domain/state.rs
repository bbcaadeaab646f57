//! Worker lifecycle state machine.
//!
//! ```text
//! [IDLE] ──connected──→ [RUNNING] ──stop──→ [DRAINING] ──disconnected──→ [STOPPED]
//!   │                                                                        ↑
//!   └──────────────────────────── connect failed ────────────────────────────┘
//! ```

use std::fmt;

/// Lifecycle state of one query worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Constructed, not yet connected.
    Idle,
    /// Connected, polling and dispatching.
    Running,
    /// Stop observed, endpoint being torn down.
    Draining,
    /// Terminal.
    Stopped,
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    Connected,
    ConnectFailed,
    StopObserved,
    Disconnected,
}

/// A transition not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: WorkerState,
    pub event: WorkerEvent,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not valid in state {:?}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

impl WorkerState {
    /// Apply an event, returning the next state.
    pub fn on(self, event: WorkerEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (Self::Idle, WorkerEvent::Connected) => Ok(Self::Running),
            (Self::Idle, WorkerEvent::ConnectFailed) => Ok(Self::Stopped),
            (Self::Running, WorkerEvent::StopObserved) => Ok(Self::Draining),
            (Self::Draining, WorkerEvent::Disconnected) => Ok(Self::Stopped),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
