//! Stage exclusivity for one creation session.
//!
//! Only one stage may run at a time. Starting a stage hands out a
//! [`StageTicket`]; finishing the ticket records the outcome and frees the
//! session. A ticket dropped without finishing (its future was cancelled)
//! marks the stage `Failed("cancelled")` so the session never stays busy.

use crate::error::WorkflowError;
use artisan_studio_core::{GenerationStage, StageKind};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Where the session stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to start a stage
    Idle,
    /// A stage is in flight
    Running(StageKind),
    /// The last stage failed; a new stage may start
    Degraded {
        /// Failed stage
        stage: StageKind,
        /// Failure reason
        reason: String,
    },
    /// Saved or abandoned; nothing may start
    Closed,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    stages: BTreeMap<StageKind, GenerationStage>,
}

/// Session-wide stage lock plus the per-stage status table.
#[derive(Debug)]
pub struct WorkflowSession {
    inner: Mutex<SessionInner>,
    cancel: CancellationToken,
}

impl Default for WorkflowSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowSession {
    /// New idle session
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                stages: BTreeMap::new(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a stage may start now.
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(
            self.lock().state,
            SessionState::Idle | SessionState::Degraded { .. }
        )
    }

    /// Start `kind`.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::Busy` if another stage is running
    /// - `WorkflowError::Closed` after save or abandonment
    pub fn begin(&self, kind: StageKind) -> Result<StageTicket<'_>, WorkflowError> {
        let mut inner = self.lock();
        match inner.state {
            SessionState::Running(running) => return Err(WorkflowError::Busy { running }),
            SessionState::Closed => return Err(WorkflowError::Closed),
            SessionState::Idle | SessionState::Degraded { .. } => {}
        }
        inner.state = SessionState::Running(kind);
        inner.stages.insert(kind, GenerationStage::Running);
        drop(inner);

        tracing::debug!(stage = %kind, "stage started");
        Ok(StageTicket {
            session: self,
            kind,
            token: self.cancel.child_token(),
            finished: false,
        })
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Status of one stage (`Idle` if never started)
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> GenerationStage {
        self.lock().stages.get(&kind).cloned().unwrap_or_default()
    }

    /// Stage currently running, if any
    #[must_use]
    pub fn running(&self) -> Option<StageKind> {
        match self.lock().state {
            SessionState::Running(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether the session is closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().state == SessionState::Closed
    }

    /// Close the session and cancel anything in flight.
    pub fn close(&self) {
        self.lock().state = SessionState::Closed;
        self.cancel.cancel();
    }

    /// Session-wide cancellation token
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    fn finish(&self, kind: StageKind, status: GenerationStage, next: SessionState) {
        let mut inner = self.lock();
        inner.stages.insert(kind, status);
        // close() may have run while the stage was in flight
        if inner.state != SessionState::Closed {
            inner.state = next;
        }
    }
}

/// Exclusive right to run one stage.
#[derive(Debug)]
pub struct StageTicket<'a> {
    session: &'a WorkflowSession,
    kind: StageKind,
    token: CancellationToken,
    finished: bool,
}

impl StageTicket<'_> {
    /// Stage this ticket runs
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        self.kind
    }

    /// Token cancelled when the session is abandoned
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Record success and return the session to `Idle`.
    pub fn succeed(mut self, note: impl Into<String>) {
        self.finished = true;
        self.session.finish(
            self.kind,
            GenerationStage::Succeeded(note.into()),
            SessionState::Idle,
        );
        tracing::debug!(stage = %self.kind, "stage succeeded");
    }

    /// Record failure and move the session to `Degraded`.
    pub fn fail(mut self, reason: impl Into<String>) {
        self.finished = true;
        let reason = reason.into();
        self.session.finish(
            self.kind,
            GenerationStage::Failed(reason.clone()),
            SessionState::Degraded {
                stage: self.kind,
                reason,
            },
        );
    }
}

impl Drop for StageTicket<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.session.finish(
                self.kind,
                GenerationStage::Failed("cancelled".to_string()),
                SessionState::Idle,
            );
            tracing::debug!(stage = %self.kind, "stage dropped before finishing");
        }
    }
}
