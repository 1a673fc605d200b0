//! LTE Core - learning-task editor
//!
//! The editing core behind a learning-task planner:
//! - A document of tasks, rows and fields with dependency provenance
//! - A single-flight regeneration orchestrator with a pluggable provider
//! - Cascade marking of the focused field after each regeneration
//! - Resolution of flagged dependencies
//!
//! # Example
//!
//! ```rust,ignore
//! use lte_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(provider: Arc<dyn ContentProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let document = lte_core::loader::load("plan.json")?;
//! let session = Session::new(Editor::new(document), provider);
//!
//! session.select_field(&FieldId::new("r1-content"))?;
//! session.request_row_regeneration(&RowId::new("row-1"))?;
//! let outcome = session.confirm_regeneration("add safety steps").await?;
//!
//! println!("applied: {}", outcome.is_applied());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod cascade;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod loader;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod session;

// Re-exports for convenience
pub use cascade::{CascadeAlert, CascadeReport, ResolveReport};
pub use config::{EditorConfig, FallbackPolicy, PagePolicy};
pub use document::{Document, FieldLocation};
pub use editor::{Editor, FieldView, GenerationOutcome, PendingGeneration, TaskSummary};
pub use error::{ConfigError, EditorError, LoadError, ModelError, ProviderError};
pub use model::{
    columns, ColumnDef, ColumnKey, Dependency, DependencyId, DependencyKind, Field, FieldId,
    RequestId, Row, RowId, Task, TaskId, UnknownColumn,
};
pub use orchestrator::{allowed_transitions, validate_transition, Orchestrator, Phase, Scope, Transition};
pub use provider::{
    placeholder_text, sanitize_response, ContentProvider, GenerateRequest, PlaceholderFallback,
};
pub use session::Session;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with LTE Core
    pub use crate::{
        ColumnKey, ContentProvider, Document, Editor, EditorConfig, EditorError, FieldId,
        GenerateRequest, GenerationOutcome, Phase, ProviderError, RowId, Scope, Session, TaskId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
