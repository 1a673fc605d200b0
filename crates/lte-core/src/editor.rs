//! Editor: the single owner of document state
//!
//! Every UI operation goes through [`Editor`], which serialises mutations
//! of the document, the orchestrator and the cascade alert. The provider
//! call itself is not made here: [`Editor::begin_regeneration`] hands out a
//! [`PendingGeneration`] and [`Editor::complete_regeneration`] applies its
//! outcome, so navigation stays possible while the call is in flight. See
//! [`crate::session::Session`] for the async driver.

use crate::cascade::{Cascade, CascadeAlert, CascadeReport, ResolveReport};
use crate::config::{EditorConfig, PagePolicy};
use crate::document::Document;
use crate::error::{EditorError, ProviderError};
use crate::model::{
    ColumnKey, Dependency, FieldId, RequestId, RowId, Task, TaskId,
};
use crate::orchestrator::{Orchestrator, Phase, Scope, Transition};
use crate::provider::{sanitize_response, GenerateRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// A confirmed request waiting for its provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGeneration {
    /// Request ID; completion must present it
    pub id: RequestId,
    /// Target captured when the request was opened
    pub scope: Scope,
    /// What to send to the provider
    pub request: GenerateRequest,
    /// When the request entered `Requesting`
    pub started_at: DateTime<Utc>,
}

/// Result of completing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum GenerationOutcome {
    /// Text written and cascade run; orchestrator back to idle
    Applied {
        /// Completed request
        request: RequestId,
        /// Target
        scope: Scope,
        /// Fields whose value was replaced
        written: Vec<FieldId>,
        /// Marking result, `None` when nothing was focused
        cascade: Option<CascadeReport>,
    },
    /// Provider failed; document untouched, request open for retry
    Failed {
        /// Failed request
        request: RequestId,
        /// Target
        scope: Scope,
        /// Cause
        error: ProviderError,
    },
}

impl GenerationOutcome {
    /// Whether the result was applied
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Read-only projection of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView<'a> {
    /// Field ID
    pub id: &'a FieldId,
    /// Column
    pub key: ColumnKey,
    /// Current value
    pub value: &'a str,
    /// Dependencies in display order
    pub dependencies: &'a [Dependency],
    /// Affected dependencies, review order
    pub review: Vec<&'a Dependency>,
}

/// Read-only projection of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Task ID
    pub id: TaskId,
    /// Display name
    pub name: String,
    /// Number of rows
    pub rows: usize,
    /// Affected dependencies across the task
    pub affected: usize,
    /// Whether this is the active task
    pub active: bool,
}

/// Single owner of the editable state
#[derive(Debug)]
pub struct Editor {
    document: Document,
    orchestrator: Orchestrator,
    cascade: Cascade,
    config: EditorConfig,
}

impl Editor {
    /// Create editor with default configuration
    #[inline]
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    /// Create editor with configuration
    #[must_use]
    pub fn with_config(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            orchestrator: Orchestrator::new(),
            cascade: Cascade::default(),
            config,
        }
    }

    // ---- projections -------------------------------------------------

    /// Document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Orchestrator (phase, scope, last error)
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Current orchestrator phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.orchestrator.phase()
    }

    /// Whether a new regeneration may be requested
    #[inline]
    #[must_use]
    pub fn can_request(&self) -> bool {
        !self.orchestrator.phase().is_busy()
    }

    /// Subscribe to orchestrator transitions
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.orchestrator.subscribe()
    }

    /// Active task
    #[inline]
    #[must_use]
    pub fn active_task(&self) -> &Task {
        self.document.active_task()
    }

    /// Focused field
    #[must_use]
    pub fn active_field(&self) -> Option<FieldView<'_>> {
        self.field_view(self.document.focus()?)
    }

    /// Active cascade alert
    #[inline]
    #[must_use]
    pub fn cascade_alert(&self) -> Option<&CascadeAlert> {
        self.cascade.alert()
    }

    /// Affected dependency count of a field
    #[must_use]
    pub fn affected_count(&self, field: &FieldId) -> Option<usize> {
        self.document.field(field).map(|f| f.affected_count())
    }

    /// Affected counts of every field in the active task, table order
    #[must_use]
    pub fn affected_counts(&self) -> Vec<(&FieldId, usize)> {
        self.document
            .active_task()
            .rows()
            .iter()
            .flat_map(|r| r.fields())
            .map(|f| (f.id(), f.affected_count()))
            .collect()
    }

    /// Projection of a field
    #[must_use]
    pub fn field_view(&self, id: &FieldId) -> Option<FieldView<'_>> {
        let field = self.document.field(id)?;
        Some(FieldView {
            id: field.id(),
            key: field.key(),
            value: field.value(),
            dependencies: field.dependencies(),
            review: field.affected_by_triage(),
        })
    }

    /// Summaries of every task, document order
    #[must_use]
    pub fn task_summaries(&self) -> Vec<TaskSummary> {
        let active = self.document.active_task_id();
        self.document
            .tasks()
            .map(|t| TaskSummary {
                id: t.id().clone(),
                name: t.name().to_string(),
                rows: t.rows().len(),
                affected: t.affected_total(),
                active: t.id() == active,
            })
            .collect()
    }

    // ---- navigation --------------------------------------------------

    /// Focus a field, dismissing any cascade alert
    ///
    /// Dependency flags of the previous focus stay as they are.
    ///
    /// # Errors
    /// [`EditorError::UnknownField`]; focus and alert are unchanged.
    pub fn select_field(&mut self, id: &FieldId) -> Result<(), EditorError> {
        if !self.document.set_focus(id) {
            return Err(EditorError::UnknownField(id.clone()));
        }
        if self.cascade.dismiss() {
            tracing::debug!(field = %id, "cascade alert dismissed by focus change");
        }
        Ok(())
    }

    /// Switch the active task
    ///
    /// Allowed while a request is in flight; the result still lands on the
    /// captured target.
    ///
    /// # Errors
    /// [`EditorError::UnknownTask`].
    pub fn switch_active_task(&mut self, id: &TaskId) -> Result<(), EditorError> {
        if self.document.set_active_task(id) {
            tracing::debug!(task = %id, "active task switched");
            Ok(())
        } else {
            Err(EditorError::UnknownTask(id.clone()))
        }
    }

    // ---- regeneration ------------------------------------------------

    /// Open a row-scoped request
    ///
    /// # Errors
    /// [`EditorError::UnknownRow`], or [`EditorError::RequestPending`] when
    /// another request is open.
    pub fn request_row_regeneration(&mut self, row: &RowId) -> Result<(), EditorError> {
        let task = self
            .document
            .task_of_row(row)
            .cloned()
            .ok_or_else(|| EditorError::UnknownRow(row.clone()))?;
        self.orchestrator.open(Scope::Row {
            task,
            row: row.clone(),
        })
    }

    /// Open a page-scoped request
    ///
    /// # Errors
    /// [`EditorError::UnknownTask`], or [`EditorError::RequestPending`] when
    /// another request is open.
    pub fn request_page_regeneration(&mut self, task: &TaskId) -> Result<(), EditorError> {
        if self.document.task(task).is_none() {
            return Err(EditorError::UnknownTask(task.clone()));
        }
        self.orchestrator.open(Scope::Page { task: task.clone() })
    }

    /// Cancel the open request
    ///
    /// # Errors
    /// [`EditorError::NoPendingRequest`], or
    /// [`EditorError::RequestPending`] while the provider call runs.
    pub fn cancel_regeneration(&mut self) -> Result<(), EditorError> {
        let scope = self.orchestrator.cancel()?;
        tracing::debug!(%scope, "regeneration cancelled");
        Ok(())
    }

    /// Confirm the instruction and move to `Requesting`
    ///
    /// # Errors
    /// [`EditorError::EmptyInstruction`] (state stays put),
    /// [`EditorError::NoPendingRequest`] or [`EditorError::RequestPending`].
    pub fn begin_regeneration(&mut self, instruction: &str) -> Result<PendingGeneration, EditorError> {
        let (id, scope) = self.orchestrator.begin(instruction)?;
        let mut request = GenerateRequest::for_scope(instruction.trim(), &scope);
        if let Some(context) = self.reference_content(&scope) {
            request = request.with_context(context);
        }
        tracing::info!(request = %id, %scope, "regeneration requested");
        Ok(PendingGeneration {
            id,
            scope,
            request,
            started_at: Utc::now(),
        })
    }

    /// Apply the provider outcome of the in-flight request
    ///
    /// Success writes the text into the captured target, runs the cascade
    /// marker and returns to `Idle`. Failure leaves the document untouched
    /// and moves to `Failed`.
    ///
    /// # Errors
    /// [`EditorError::StaleRequest`] when `id` is not the request in
    /// flight; nothing changes.
    pub fn complete_regeneration(
        &mut self,
        id: RequestId,
        result: Result<String, ProviderError>,
    ) -> Result<GenerationOutcome, EditorError> {
        self.orchestrator.check_in_flight(id)?;
        let scope = self
            .orchestrator
            .scope()
            .cloned()
            .ok_or(EditorError::NoPendingRequest)?;

        let text = match result.and_then(|text| sanitize_response(&text)) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(request = %id, %scope, %error, "regeneration failed");
                self.orchestrator.fail(error.to_string())?;
                return Ok(GenerationOutcome::Failed {
                    request: id,
                    scope,
                    error,
                });
            }
        };

        let written = self.apply(&scope, &text);
        self.orchestrator.applied()?;
        let cascade = self.cascade.mark(&mut self.document, id);
        self.orchestrator.settle()?;

        tracing::info!(
            request = %id,
            %scope,
            written = written.len(),
            marked = cascade.as_ref().map_or(0, |c| c.affected),
            "regeneration applied"
        );
        Ok(GenerationOutcome::Applied {
            request: id,
            scope,
            written,
            cascade,
        })
    }

    /// Clear the focused field's dependency flags and the alert
    ///
    /// Returns `None` when nothing is focused.
    pub fn resolve_cascade(&mut self) -> Option<ResolveReport> {
        self.cascade.resolve(&mut self.document)
    }

    fn reference_content(&self, scope: &Scope) -> Option<String> {
        match scope {
            Scope::Row { row, .. } => self
                .document
                .row(row)?
                .field(ColumnKey::PRIMARY)
                .map(|f| f.value().to_string()),
            Scope::Page { task } => self.document.task(task).map(|t| t.name().to_string()),
        }
    }

    /// Write `text` into the target; page scope is swapped in whole
    fn apply(&mut self, scope: &Scope, text: &str) -> Vec<FieldId> {
        match scope {
            Scope::Row { row, .. } => {
                let Some(target) = self
                    .document
                    .row(row)
                    .and_then(|r| r.field(ColumnKey::PRIMARY))
                    .map(|f| f.id().clone())
                else {
                    return Vec::new();
                };
                if let Some(field) = self.document.field_mut(&target) {
                    field.set_value(text.to_string());
                }
                vec![target]
            }
            Scope::Page { task } => {
                let policy = self.config.page_policy;
                let Some(live) = self.document.task_mut(task) else {
                    return Vec::new();
                };
                let mut staged = live.clone();
                let mut written = Vec::new();
                for row in staged.rows_mut() {
                    for field in row.fields_mut() {
                        if policy == PagePolicy::AllFields || field.key().is_primary() {
                            field.set_value(text.to_string());
                            written.push(field.id().clone());
                        }
                    }
                }
                *live = staged;
                written
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyKind, Field, Row};
    use pretty_assertions::assert_eq;

    fn row(id: &str, content: &str) -> Row {
        Row::new(
            id,
            ColumnKey::ALL.into_iter().map(|k| {
                let value = if k.is_primary() { content.to_string() } else { format!("{k}") };
                Field::new(format!("{id}-{k}"), k, value).with_dependencies(vec![
                    Dependency::new("d1", "Standard", DependencyKind::Copy, "a"),
                    Dependency::new("d2", "Course", DependencyKind::Expand, "b"),
                ])
            }),
        )
    }

    fn editor() -> Editor {
        let doc = Document::new(vec![
            Task::new("T1", "One", vec![row("r1", "draft text"), row("r2", "second")]),
            Task::new("T2", "Two", vec![row("r3", "other")]),
        ])
        .unwrap();
        Editor::new(doc)
    }

    fn fid(s: &str) -> FieldId {
        FieldId::new(s)
    }

    #[test]
    fn end_to_end_row_regeneration() {
        let mut ed = editor();
        ed.select_field(&fid("r1-content")).unwrap();
        ed.request_row_regeneration(&RowId::new("r1")).unwrap();
        let pending = ed.begin_regeneration("make it safer").unwrap();
        assert_eq!(pending.request.context.as_deref(), Some("draft text"));

        let outcome = ed
            .complete_regeneration(pending.id, Ok("revised text".into()))
            .unwrap();
        assert!(outcome.is_applied());
        assert_eq!(ed.phase(), Phase::Idle);

        let field = ed.active_field().unwrap();
        assert_eq!(field.value, "revised text");
        assert!(field.dependencies.iter().all(Dependency::is_affected));
        assert_eq!(ed.cascade_alert().unwrap().field, fid("r1-content"));

        let report = ed.resolve_cascade().unwrap();
        assert_eq!(report.cleared, 2);
        assert_eq!(ed.affected_count(&fid("r1-content")), Some(0));
        assert!(ed.cascade_alert().is_none());
    }

    #[test]
    fn result_lands_on_captured_row_after_navigation() {
        let mut ed = editor();
        ed.request_row_regeneration(&RowId::new("r2")).unwrap();
        let pending = ed.begin_regeneration("shorter").unwrap();

        ed.switch_active_task(&TaskId::new("T2")).unwrap();
        ed.select_field(&fid("r3-outcome")).unwrap();

        ed.complete_regeneration(pending.id, Ok("short".into())).unwrap();
        let doc = ed.document();
        assert_eq!(doc.field(&fid("r2-content")).unwrap().value(), "short");
        assert_eq!(doc.field(&fid("r3-content")).unwrap().value(), "other");
        // Proxy cascade: the focus, not the regenerated field, is marked
        assert_eq!(ed.affected_count(&fid("r3-outcome")), Some(2));
        assert_eq!(ed.affected_count(&fid("r2-content")), Some(0));
    }

    #[test]
    fn failure_leaves_document_and_allows_retry() {
        let mut ed = editor();
        ed.select_field(&fid("r1-step")).unwrap();
        let before = ed.document().clone();
        ed.request_row_regeneration(&RowId::new("r1")).unwrap();
        let pending = ed.begin_regeneration("x").unwrap();

        let outcome = ed
            .complete_regeneration(pending.id, Err(ProviderError::Transport("down".into())))
            .unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(ed.phase(), Phase::Failed);
        assert_eq!(ed.document(), &before);
        assert!(ed.cascade_alert().is_none());

        let retry = ed.begin_regeneration("x again").unwrap();
        assert_eq!(retry.scope, pending.scope);
        ed.complete_regeneration(retry.id, Ok("ok".into())).unwrap();
        assert_eq!(ed.document().field(&fid("r1-content")).unwrap().value(), "ok");
    }

    #[test]
    fn blank_response_is_a_failure() {
        let mut ed = editor();
        ed.request_row_regeneration(&RowId::new("r1")).unwrap();
        let pending = ed.begin_regeneration("x").unwrap();
        let outcome = ed.complete_regeneration(pending.id, Ok("  ".into())).unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Failed {
                error: ProviderError::EmptyResponse,
                ..
            }
        ));
        assert_eq!(ed.document().field(&fid("r1-content")).unwrap().value(), "draft text");
    }

    #[test]
    fn stale_completion_is_rejected() {
        let mut ed = editor();
        ed.request_row_regeneration(&RowId::new("r1")).unwrap();
        let first = ed.begin_regeneration("x").unwrap();
        ed.complete_regeneration(first.id, Err(ProviderError::Cancelled)).unwrap();
        let second = ed.begin_regeneration("y").unwrap();

        assert_eq!(
            ed.complete_regeneration(first.id, Ok("late".into())),
            Err(EditorError::StaleRequest(first.id))
        );
        assert_eq!(ed.phase(), Phase::Requesting);
        assert_eq!(ed.orchestrator().in_flight(), Some(second.id));
    }

    #[test]
    fn page_regeneration_writes_primary_field_of_every_row() {
        let mut ed = editor();
        ed.request_page_regeneration(&TaskId::new("T1")).unwrap();
        let pending = ed.begin_regeneration("replan").unwrap();
        assert!(pending.request.is_full_scope);
        assert_eq!(pending.request.context.as_deref(), Some("One"));

        let outcome = ed.complete_regeneration(pending.id, Ok("plan".into())).unwrap();
        let GenerationOutcome::Applied { written, cascade, .. } = outcome else {
            panic!("expected applied");
        };
        assert_eq!(written, vec![fid("r1-content"), fid("r2-content")]);
        assert!(cascade.is_none());
        assert_eq!(ed.document().field(&fid("r1-step")).unwrap().value(), "step");
        assert_eq!(ed.document().field(&fid("r3-content")).unwrap().value(), "other");
    }

    #[test]
    fn page_regeneration_all_fields_policy() {
        let doc = editor().document().clone();
        let mut ed = Editor::with_config(
            doc,
            EditorConfig::new().with_page_policy(PagePolicy::AllFields),
        );
        ed.request_page_regeneration(&TaskId::new("T2")).unwrap();
        let pending = ed.begin_regeneration("replan").unwrap();
        ed.complete_regeneration(pending.id, Ok("same".into())).unwrap();
        let task = ed.document().task(&TaskId::new("T2")).unwrap();
        assert!(task.rows()[0].fields().all(|f| f.value() == "same"));
    }

    #[test]
    fn unknown_ids_are_rejected_without_change() {
        let mut ed = editor();
        ed.select_field(&fid("r1-hours")).unwrap();
        assert_eq!(
            ed.select_field(&fid("nope")),
            Err(EditorError::UnknownField(fid("nope")))
        );
        assert_eq!(ed.document().focus(), Some(&fid("r1-hours")));
        assert_eq!(
            ed.request_row_regeneration(&RowId::new("r9")),
            Err(EditorError::UnknownRow(RowId::new("r9")))
        );
        assert_eq!(
            ed.switch_active_task(&TaskId::new("T9")),
            Err(EditorError::UnknownTask(TaskId::new("T9")))
        );
        assert_eq!(ed.phase(), Phase::Idle);
    }

    #[test]
    fn focus_change_dismisses_alert_but_keeps_flags() {
        let mut ed = editor();
        ed.select_field(&fid("r1-content")).unwrap();
        ed.request_row_regeneration(&RowId::new("r1")).unwrap();
        let pending = ed.begin_regeneration("x").unwrap();
        ed.complete_regeneration(pending.id, Ok("y".into())).unwrap();
        assert!(ed.cascade_alert().is_some());

        ed.select_field(&fid("r2-content")).unwrap();
        assert!(ed.cascade_alert().is_none());
        assert_eq!(ed.affected_count(&fid("r1-content")), Some(2));

        // Revisiting does not clear; only resolve does
        ed.select_field(&fid("r1-content")).unwrap();
        assert_eq!(ed.affected_count(&fid("r1-content")), Some(2));
        ed.resolve_cascade().unwrap();
        assert_eq!(ed.affected_count(&fid("r1-content")), Some(0));
    }

    #[test]
    fn summaries_track_affected_totals() {
        let mut ed = editor();
        ed.select_field(&fid("r3-hours")).unwrap();
        ed.request_page_regeneration(&TaskId::new("T1")).unwrap();
        let pending = ed.begin_regeneration("x").unwrap();
        ed.complete_regeneration(pending.id, Ok("y".into())).unwrap();

        let summaries = ed.task_summaries();
        assert_eq!(summaries[0].affected, 0);
        assert!(summaries[0].active);
        assert_eq!(summaries[1].affected, 2);
        assert_eq!(ed.affected_counts().len(), 14);
    }
}
