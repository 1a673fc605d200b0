//! Error types for the editor core
//!
//! Provides error handling for:
//! - Document invariant violations found at load time
//! - Loader I/O and format failures
//! - Precondition violations on editor operations
//! - Content provider failures
//! - Configuration loading

use crate::model::{ColumnKey, DependencyId, FieldId, RequestId, RowId, TaskId};
use crate::orchestrator::Phase;
use std::path::PathBuf;

/// Document invariant violations
///
/// A loader producing any of these must reject the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Document has no tasks
    #[error("document contains no tasks")]
    EmptyDocument,

    /// Two tasks share an ID
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),

    /// Two rows share an ID
    #[error("duplicate row id: {0}")]
    DuplicateRow(RowId),

    /// Two fields share an ID
    #[error("duplicate field id: {0}")]
    DuplicateField(FieldId),

    /// Two dependencies of one field share an ID
    #[error("duplicate dependency id {dependency} on field {field}")]
    DuplicateDependency {
        /// Owning field
        field: FieldId,
        /// Repeated dependency ID
        dependency: DependencyId,
    },

    /// Row does not supply every column
    #[error("row {row} is missing columns {columns:?}")]
    MissingColumns {
        /// Incomplete row
        row: RowId,
        /// Columns without a field
        columns: Vec<ColumnKey>,
    },

    /// Field filed under a column other than its own key
    #[error("field {field} declares key {declared} but is stored under {stored}")]
    KeyMismatch {
        /// Offending field
        field: FieldId,
        /// Key carried by the field
        declared: ColumnKey,
        /// Column it was stored under
        stored: ColumnKey,
    },

    /// Row supplies the same column twice
    #[error("row {row} supplies column {key} more than once")]
    DuplicateColumn {
        /// Offending row
        row: RowId,
        /// Repeated column
        key: ColumnKey,
    },

    /// Active task does not exist
    #[error("active task {0} does not exist")]
    UnknownActiveTask(TaskId),
}

/// Loader errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Reading or writing the document file failed
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON for the document format
    #[error("malformed document: {0}")]
    Format(#[from] serde_json::Error),

    /// Document violates a model invariant
    #[error("invalid document: {0}")]
    Invalid(#[from] ModelError),
}

/// Rejected editor operations
///
/// All of these leave editor state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// Instruction is empty or whitespace
    #[error("instruction must not be empty")]
    EmptyInstruction,

    /// A regeneration request is already open or in flight
    #[error("a regeneration request is already {0}")]
    RequestPending(Phase),

    /// Operation needs an open request
    #[error("no regeneration request is open")]
    NoPendingRequest,

    /// Completion does not match the in-flight request
    #[error("request {0} is not in flight")]
    StaleRequest(RequestId),

    /// Unknown task
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// Unknown row
    #[error("unknown row: {0}")]
    UnknownRow(RowId),

    /// Unknown field
    #[error("unknown field: {0}")]
    UnknownField(FieldId),

    /// State machine refused a transition
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },
}

impl EditorError {
    /// Check if error is local input validation (no document impact)
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::IllegalTransition { .. })
    }
}

/// Content provider failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderError {
    /// Network or transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with an error status
    #[error("provider returned status {status}: {message}")]
    Status {
        /// HTTP-like status code
        status: u16,
        /// Provider message
        message: String,
    },

    /// Response could not be interpreted
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Response carried no text
    #[error("provider returned no content")]
    EmptyResponse,

    /// Call exceeded its time budget
    #[error("provider call timed out after {duration_ms}ms")]
    Timeout {
        /// Budget in milliseconds
        duration_ms: u64,
    },

    /// Call was cancelled by the caller
    #[error("provider call cancelled")]
    Cancelled,

    /// Provider is misconfigured
    #[error("provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Check if retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::Cancelled | Self::EmptyResponse => {
                true
            }
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) | Self::Config(_) => false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value for {key}: {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
