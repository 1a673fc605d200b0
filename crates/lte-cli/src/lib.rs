//! LTE CLI - command implementations behind the `lte` binary
//!
//! Each command loads a plan document, runs one editor operation and
//! writes the result back. Commands return structured reports so the
//! binary can print them as text or JSON.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{bail, Context, Result};
use lte_core::{
    loader, ContentProvider, Document, Editor, EditorConfig, FallbackPolicy, FieldId,
    GenerationOutcome, ResolveReport, RowId, Session, TaskId,
};
use lte_provider::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Contents of the `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub editor: EditorConfig,
    pub provider: GeminiConfig,
}

impl FileConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Malformed TOML or out-of-range editor values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.editor.validate()?;
        Ok(config)
    }

    /// Load from file
    ///
    /// # Errors
    /// Unreadable file, or as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Load from `path` if given, else defaults
    ///
    /// # Errors
    /// As [`Self::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lte_core=info,lte_provider=info,lte_cli=info"));
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so stdout stays parseable
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Counts reported by `validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateReport {
    pub tasks: usize,
    pub rows: usize,
    pub fields: usize,
    pub dependencies: usize,
    pub affected: usize,
}

/// Load a document and count its contents
///
/// # Errors
/// Any load or validation failure.
pub fn validate(path: &Path) -> Result<ValidateReport> {
    let doc = load(path)?;
    Ok(ValidateReport {
        tasks: doc.task_count(),
        rows: doc.tasks().map(|t| t.rows().len()).sum(),
        fields: doc.fields().count(),
        dependencies: doc.fields().map(|f| f.dependencies().len()).sum(),
        affected: doc.fields().map(|f| f.affected_count()).sum(),
    })
}

/// Render a task as text; defaults to the active task
///
/// # Errors
/// Unknown task ID.
pub fn render_task(doc: &Document, task: Option<&TaskId>) -> Result<String> {
    let task = match task {
        Some(id) => doc
            .task(id)
            .with_context(|| format!("unknown task {id}"))?,
        None => doc.active_task(),
    };

    let mut out = String::new();
    for other in doc.tasks() {
        let marker = if other.id() == task.id() { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {} ({}) affected={}",
            other.name(),
            other.id(),
            other.affected_total()
        );
    }
    for row in task.rows() {
        let _ = writeln!(out, "\n[{}]", row.id());
        for field in row.fields() {
            let def = field.key().def();
            let flags = match field.affected_count() {
                0 => String::new(),
                n => format!("  (! {n}/{} affected)", field.dependencies().len()),
            };
            let _ = writeln!(out, "  {:<18} {}{flags}", def.header, field.value());
        }
    }
    Ok(out)
}

/// What a `regenerate` run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Row(RowId),
    Page(TaskId),
}

/// Options for [`regenerate`]
#[derive(Debug, Clone)]
pub struct RegenerateOptions {
    pub input: PathBuf,
    /// Defaults to `input`
    pub output: Option<PathBuf>,
    pub target: Target,
    pub instruction: String,
    pub focus: Option<FieldId>,
    pub timeout: Option<Duration>,
    pub placeholder_fallback: bool,
    pub editor: EditorConfig,
}

/// Run one regeneration and save the document if it was applied
///
/// # Errors
/// Load, precondition or save failures. A provider failure is not an
/// error here; it comes back as [`GenerationOutcome::Failed`] and nothing
/// is written.
pub async fn regenerate(
    options: RegenerateOptions,
    provider: Arc<dyn ContentProvider>,
) -> Result<GenerationOutcome> {
    let doc = load(&options.input)?;
    let mut config = options.editor;
    if let Some(timeout) = options.timeout {
        config = config.with_timeout(timeout);
    }
    if options.placeholder_fallback {
        config = config.with_fallback(FallbackPolicy::Placeholder);
    }

    let session = Session::new(Editor::with_config(doc, config), provider);
    if let Some(focus) = &options.focus {
        session.select_field(focus)?;
    }
    match &options.target {
        Target::Row(row) => session.request_row_regeneration(row)?,
        Target::Page(task) => session.request_page_regeneration(task)?,
    }

    let outcome = session.confirm_regeneration(&options.instruction).await?;
    if outcome.is_applied() {
        let output = options.output.as_deref().unwrap_or(&options.input);
        loader::save(&session.snapshot(), output)?;
        tracing::info!(path = %output.display(), "document saved");
    }
    Ok(outcome)
}

/// Clear the dependency flags of one field and save
///
/// # Errors
/// Load failure, unknown field or save failure.
pub fn resolve(input: &Path, field: &FieldId, output: Option<&Path>) -> Result<ResolveReport> {
    let mut editor = Editor::new(load(input)?);
    editor.select_field(field)?;
    let Some(report) = editor.resolve_cascade() else {
        bail!("field {field} could not be resolved");
    };
    loader::save(editor.document(), output.unwrap_or(input))?;
    Ok(report)
}

fn load(path: &Path) -> Result<Document> {
    loader::load(path).with_context(|| format!("loading {}", path.display()))
}
