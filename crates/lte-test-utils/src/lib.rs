//! Testing utilities for the learning-task editor workspace
//!
//! Shared fixtures and scripted content providers.

#![allow(missing_docs)]

use async_trait::async_trait;
use lte_core::{
    ColumnKey, ContentProvider, Dependency, DependencyKind, Document, Editor, Field, GenerateRequest,
    ProviderError, Row, Task,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

const STANDARD_SOURCE: &str = "Course objectives > Professional conduct";
const STANDARD_CONTENT: &str =
    "Students work carefully, follow safe operating procedure and return tools after use.";
const PRIOR_SOURCE: &str = "Prerequisite course > Basic circuits";
const PRIOR_CONTENT: &str = "Ohm's law calculations; series and parallel circuit behaviour.";

/// Field with the two standard dependencies
///
/// The first dependency has `kind`, the second is always an expansion.
pub fn field(id: &str, key: ColumnKey, value: &str, kind: DependencyKind) -> Field {
    Field::new(id, key, value).with_dependencies(vec![
        Dependency::new(format!("dep-{id}-1"), STANDARD_SOURCE, kind, STANDARD_CONTENT),
        Dependency::new(format!("dep-{id}-2"), PRIOR_SOURCE, DependencyKind::Expand, PRIOR_CONTENT),
    ])
}

/// Row of seven fields using the short id scheme `{prefix}-step`, `{prefix}-sa`, ...
pub fn row(id: &str, prefix: &str, values: [&str; 7], content_kind: DependencyKind) -> Row {
    let suffix = |key: ColumnKey| match key {
        ColumnKey::Step => "step",
        ColumnKey::Hours => "hours",
        ColumnKey::Content => "content",
        ColumnKey::StudentActivity => "sa",
        ColumnKey::TeacherActivity => "ta",
        ColumnKey::Outcome => "out",
        ColumnKey::Resources => "res",
    };
    Row::new(
        id,
        ColumnKey::ALL.into_iter().zip(values).map(|(key, value)| {
            let kind = if key.is_primary() { content_kind } else { DependencyKind::Reference };
            field(&format!("{prefix}-{}", suffix(key)), key, value, kind)
        }),
    )
}

/// Two-task plan: `task-1` with rows `row-1..row-3`, `task-2` with `row-2-1`
pub fn sample_document() -> Document {
    let task1 = Task::new(
        "task-1",
        "Task 1: Hoist distribution box assembly",
        vec![
            row(
                "row-1",
                "r1",
                [
                    "1. Read the assembly work order",
                    "2",
                    "Low-voltage distribution equipment; work order structure.",
                    "Read the work order and pick out power, location and schedule.",
                    "Guide students through the key elements of the work order.",
                    "Key facts: 3kW load, corner of the workshop, one week.",
                    "Work order; pen and notebook.",
                ],
                DependencyKind::Copy,
            ),
            row(
                "row-2",
                "r2",
                [
                    "2. Compute the hoist current",
                    "2",
                    "Power and current (P=UI); breaker sizing rules.",
                    "Compute the rated current and choose a breaker rating.",
                    "Explain the calculation and hand out the site code.",
                    "Assembly plan with parts list and layout.",
                    "Calculator; temporary site power code.",
                ],
                DependencyKind::Logic,
            ),
            row(
                "row-3",
                "r3",
                [
                    "3. Prepare tools and materials",
                    "1",
                    "Checking a materials list; inspecting hand tools.",
                    "Count tools against the list and test the multimeter.",
                    "Check the count and demonstrate the multimeter test.",
                    "Complete tool kit in good order; safety measures in place.",
                    "Materials list; multimeter; lock-out sign.",
                ],
                DependencyKind::Reference,
            ),
        ],
    );
    let task2 = Task::new(
        "task-2",
        "Task 2: Lighting circuit installation",
        vec![row(
            "row-2-1",
            "r21",
            [
                "1. Survey the site",
                "4",
                "Using the survey sheet; spotting hazards.",
                "Record fixture positions and switch heights in groups.",
                "Stress site safety and show the measuring tools.",
                "Site survey report.",
                "Tape measure; lux meter.",
            ],
            DependencyKind::Reference,
        )],
    );
    Document::new(vec![task1, task2]).unwrap()
}

/// Single task `T1` with row `r1`; content field `r1-content` holds "draft text"
pub fn scenario_document() -> Document {
    let values = ["step", "1", "draft text", "listen", "explain", "notes", "slides"];
    Document::new(vec![Task::new(
        "T1",
        "Scenario",
        vec![row("r1", "r1", values, DependencyKind::Copy)],
    )])
    .unwrap()
}

pub fn sample_editor() -> Editor {
    Editor::new(sample_document())
}

/// Always answers with the same text
#[derive(Debug, Clone)]
pub struct StaticProvider(pub String);

impl StaticProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl ContentProvider for StaticProvider {
    async fn generate(&self, _request: &GenerateRequest) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Always fails with the same error
#[derive(Debug, Clone)]
pub struct FailingProvider(pub ProviderError);

#[async_trait]
impl ContentProvider for FailingProvider {
    async fn generate(&self, _request: &GenerateRequest) -> Result<String, ProviderError> {
        Err(self.0.clone())
    }
}

/// Replays queued replies and records every request
///
/// Fails with a transport error once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("script exhausted".to_string())))
    }
}

/// Sleeps before answering; use with a paused clock
#[derive(Debug, Clone)]
pub struct SlowProvider {
    pub delay: Duration,
    pub text: String,
}

impl SlowProvider {
    pub fn new(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            delay,
            text: text.into(),
        }
    }
}

#[async_trait]
impl ContentProvider for SlowProvider {
    async fn generate(&self, _request: &GenerateRequest) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.clone())
    }
}
