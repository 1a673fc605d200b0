//! Regeneration orchestrator
//!
//! Lifecycle of a single regeneration request:
//!
//! ```text
//! Idle -> AwaitingInput -> Requesting -> Applied -> Idle
//!              ^   |            |
//!              |   v            v
//!              | Idle         Failed --(retry)--> Requesting
//!              |                 |
//!              +-----------------+--(cancel)--> Idle
//! ```
//!
//! Only one request exists at a time, globally. Starting another while one
//! is open, failed or in flight is refused without touching state.

use crate::error::EditorError;
use crate::model::{RequestId, RowId, TaskId};
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

/// Orchestrator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No request open
    Idle,
    /// Request opened, waiting for the user's instruction
    AwaitingInput,
    /// Provider call in flight
    Requesting,
    /// Result written, cascade run (transient)
    Applied,
    /// Provider call failed; retry or cancel
    Failed,
}

impl Phase {
    /// Whether a request context exists in this phase
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Applied)
    }

    /// Whether an instruction may be confirmed in this phase
    #[inline]
    #[must_use]
    pub fn accepts_instruction(&self) -> bool {
        matches!(self, Phase::AwaitingInput | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::AwaitingInput => "awaiting-input",
            Phase::Requesting => "requesting",
            Phase::Applied => "applied",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: Phase) -> &'static [Phase] {
    use Phase::*;
    match from {
        Idle => &[AwaitingInput],
        AwaitingInput => &[Requesting, Idle],
        Requesting => &[Applied, Failed],
        Applied => &[Idle],
        Failed => &[Requesting, Idle],
    }
}

/// Validates a phase transition
///
/// # Errors
/// [`EditorError::IllegalTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), EditorError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EditorError::IllegalTransition { from, to })
    }
}

/// Breadth of a regeneration, captured when the request is opened
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", rename_all = "kebab-case")]
pub enum Scope {
    /// One row's primary content
    Row {
        /// Task owning the row
        task: TaskId,
        /// Target row
        row: RowId,
    },
    /// Every row of a task
    Page {
        /// Target task
        task: TaskId,
    },
}

impl Scope {
    /// Task the result lands in
    #[inline]
    #[must_use]
    pub fn task(&self) -> &TaskId {
        match self {
            Scope::Row { task, .. } | Scope::Page { task } => task,
        }
    }

    /// Target row for row scope
    #[inline]
    #[must_use]
    pub fn row(&self) -> Option<&RowId> {
        match self {
            Scope::Row { row, .. } => Some(row),
            Scope::Page { .. } => None,
        }
    }

    /// Whether the request covers the whole task
    #[inline]
    #[must_use]
    pub fn is_full_scope(&self) -> bool {
        matches!(self, Scope::Page { .. })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Row { task, row } => write!(f, "row {row} of {task}"),
            Scope::Page { task } => write!(f, "page {task}"),
        }
    }
}

/// A recorded phase change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Monotonic sequence number
    pub seq: u64,
    /// Previous phase
    pub from: Phase,
    /// New phase
    pub to: Phase,
    /// Request involved, once one was issued
    pub request: Option<RequestId>,
}

const TRANSITION_CAPACITY: usize = 64;

/// Single-flight regeneration state machine
///
/// Holds the captured scope and the in-flight request ID; the document
/// itself is owned by the editor.
#[derive(Debug)]
pub struct Orchestrator {
    phase: Phase,
    scope: Option<Scope>,
    in_flight: Option<RequestId>,
    last_instruction: Option<String>,
    last_error: Option<String>,
    seq: u64,
    events: broadcast::Sender<Transition>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create idle orchestrator
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            phase: Phase::Idle,
            scope: None,
            in_flight: None,
            last_instruction: None,
            last_error: None,
            seq: 0,
            events,
        }
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Captured scope of the open request
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    /// Request currently in flight
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Last confirmed instruction of the open request (for retry)
    #[inline]
    #[must_use]
    pub fn last_instruction(&self) -> Option<&str> {
        self.last_instruction.as_deref()
    }

    /// Message of the last provider failure, while in `Failed`
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Subscribe to phase transitions
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }

    /// Open a request: `Idle -> AwaitingInput`
    pub(crate) fn open(&mut self, scope: Scope) -> Result<(), EditorError> {
        if self.phase.is_busy() {
            tracing::debug!(phase = %self.phase, %scope, "regeneration already pending, ignoring");
            return Err(EditorError::RequestPending(self.phase));
        }
        self.transition(Phase::AwaitingInput)?;
        self.scope = Some(scope);
        Ok(())
    }

    /// Confirm an instruction: `AwaitingInput | Failed -> Requesting`
    pub(crate) fn begin(&mut self, instruction: &str) -> Result<(RequestId, Scope), EditorError> {
        if !self.phase.accepts_instruction() {
            return Err(match self.phase {
                Phase::Requesting => EditorError::RequestPending(Phase::Requesting),
                _ => EditorError::NoPendingRequest,
            });
        }
        if instruction.trim().is_empty() {
            return Err(EditorError::EmptyInstruction);
        }
        let scope = self.scope.clone().ok_or(EditorError::NoPendingRequest)?;

        let id = RequestId::new();
        self.in_flight = Some(id);
        self.transition(Phase::Requesting)?;
        self.last_instruction = Some(instruction.to_string());
        self.last_error = None;
        Ok((id, scope))
    }

    /// Check that `id` is the request in flight
    pub(crate) fn check_in_flight(&self, id: RequestId) -> Result<(), EditorError> {
        if self.phase == Phase::Requesting && self.in_flight == Some(id) {
            Ok(())
        } else {
            Err(EditorError::StaleRequest(id))
        }
    }

    /// Result written: `Requesting -> Applied`
    pub(crate) fn applied(&mut self) -> Result<(), EditorError> {
        self.transition(Phase::Applied)
    }

    /// Cascade done: `Applied -> Idle`, request closed
    pub(crate) fn settle(&mut self) -> Result<(), EditorError> {
        self.in_flight = None;
        self.scope = None;
        self.last_instruction = None;
        self.transition(Phase::Idle)
    }

    /// Provider failed: `Requesting -> Failed`, scope kept for retry
    pub(crate) fn fail(&mut self, message: String) -> Result<(), EditorError> {
        self.transition(Phase::Failed)?;
        self.in_flight = None;
        self.last_error = Some(message);
        Ok(())
    }

    /// Cancel an open request: `AwaitingInput | Failed -> Idle`
    pub(crate) fn cancel(&mut self) -> Result<Scope, EditorError> {
        match self.phase {
            Phase::AwaitingInput | Phase::Failed => {
                self.transition(Phase::Idle)?;
                self.last_instruction = None;
                self.last_error = None;
                self.scope.take().ok_or(EditorError::NoPendingRequest)
            }
            Phase::Requesting => Err(EditorError::RequestPending(Phase::Requesting)),
            Phase::Idle | Phase::Applied => Err(EditorError::NoPendingRequest),
        }
    }

    fn transition(&mut self, to: Phase) -> Result<(), EditorError> {
        validate_transition(self.phase, to)?;
        let from = std::mem::replace(&mut self.phase, to);
        self.seq += 1;
        tracing::debug!(%from, %to, seq = self.seq, request = ?self.in_flight, "regeneration transition");
        // No subscribers is fine.
        let _ = self.events.send(Transition {
            seq: self.seq,
            from,
            to,
            request: self.in_flight,
        });
        Ok(())
    }
}
