//! Cascade marking and resolution
//!
//! After any successful regeneration, every dependency of the focused field
//! is flagged as possibly stale and an alert is raised for that field. The
//! focus may sit in a different row or task than the regenerated content;
//! the alert means "something changed, re-examine what you are looking at",
//! not a computed provenance impact.
//!
//! Resolution clears the flags of the focused field and drops the alert.
//! It performs no content synchronisation.

use crate::document::Document;
use crate::model::{FieldId, RequestId};
use serde::Serialize;

/// UI-facing alert for the focused field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeAlert {
    /// Field whose dependencies were flagged
    pub field: FieldId,
    /// Regeneration that raised the alert
    pub request: RequestId,
}

/// Outcome of marking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Marked field
    pub field: FieldId,
    /// Dependencies newly flagged
    pub newly_affected: usize,
    /// Dependencies flagged after marking
    pub affected: usize,
}

/// Outcome of resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Resolved field
    pub field: FieldId,
    /// Dependencies cleared
    pub cleared: usize,
    /// Whether an alert was active
    pub alert_cleared: bool,
}

/// Alert state of the editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    alert: Option<CascadeAlert>,
}

impl Cascade {
    /// Active alert, if any
    #[inline]
    #[must_use]
    pub fn alert(&self) -> Option<&CascadeAlert> {
        self.alert.as_ref()
    }

    /// Flag every dependency of the focused field and raise the alert
    ///
    /// Without a focus nothing is marked and no alert is raised.
    pub(crate) fn mark(&mut self, document: &mut Document, request: RequestId) -> Option<CascadeReport> {
        let focus = document.focus()?.clone();
        let field = document.field_mut(&focus)?;
        let newly_affected = field.flag_dependencies(true);
        let affected = field.affected_count();

        tracing::info!(field = %focus, newly_affected, affected, %request, "cascade marked");
        self.alert = Some(CascadeAlert {
            field: focus.clone(),
            request,
        });
        Some(CascadeReport {
            field: focus,
            newly_affected,
            affected,
        })
    }

    /// Clear every flag of the focused field and drop the alert
    pub(crate) fn resolve(&mut self, document: &mut Document) -> Option<ResolveReport> {
        let focus = document.focus()?.clone();
        let field = document.field_mut(&focus)?;
        let cleared = field.flag_dependencies(false);
        let alert_cleared = self.alert.take().is_some();

        tracing::info!(field = %focus, cleared, "cascade resolved");
        Some(ResolveReport {
            field: focus,
            cleared,
            alert_cleared,
        })
    }

    /// Drop the alert without touching flags
    pub(crate) fn dismiss(&mut self) -> bool {
        self.alert.take().is_some()
    }
}
