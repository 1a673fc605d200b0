//! Async session driving the provider call
//!
//! [`Session`] wraps an [`Editor`] behind a lock and runs the provider call
//! between [`Editor::begin_regeneration`] and
//! [`Editor::complete_regeneration`]. The lock is never held across the
//! call, so navigation and focus changes stay live while it runs. The call
//! is bounded by the configured timeout and can be aborted through a
//! oneshot channel. Dropping the confirm future fails the request, so the
//! editor never stays in [`Phase::Requesting`] without a caller.

use crate::cascade::ResolveReport;
use crate::config::FallbackPolicy;
use crate::document::Document;
use crate::editor::{Editor, GenerationOutcome};
use crate::error::{EditorError, ProviderError};
use crate::model::{FieldId, RequestId, RowId, TaskId};
use crate::orchestrator::{Phase, Transition};
use crate::provider::{ContentProvider, GenerateRequest, PlaceholderFallback};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// Shared handle to an editor and its provider
#[derive(Clone)]
pub struct Session {
    editor: Arc<Mutex<Editor>>,
    provider: Arc<dyn ContentProvider>,
    timeout: Duration,
    abort: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

/// Bounds the inner provider by the request timeout
struct Deadline {
    inner: Arc<dyn ContentProvider>,
    timeout: Duration,
}

#[async_trait]
impl ContentProvider for Deadline {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.generate(request))
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }
}

/// Fails the in-flight request unless disarmed
struct InFlight {
    editor: Arc<Mutex<Editor>>,
    abort: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    id: RequestId,
    armed: bool,
}

impl InFlight {
    fn disarm(mut self) {
        self.armed = false;
        self.abort.lock().take();
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.abort.lock().take();
        let result = self
            .editor
            .lock()
            .complete_regeneration(self.id, Err(ProviderError::Cancelled));
        tracing::warn!(request = %self.id, ok = result.is_ok(), "confirm dropped, request failed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("timeout", &self.timeout)
            .field("in_flight", &self.abort.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create session
    ///
    /// The provider is bounded by the request timeout, then wrapped in
    /// [`PlaceholderFallback`] when the editor's configuration asks for it,
    /// so a timeout also gets the placeholder. Aborts never do.
    #[must_use]
    pub fn new(editor: Editor, provider: Arc<dyn ContentProvider>) -> Self {
        let config = editor.config();
        let timeout = config.request_timeout();
        let provider: Arc<dyn ContentProvider> = Arc::new(Deadline { inner: provider, timeout });
        let provider: Arc<dyn ContentProvider> = match config.fallback {
            FallbackPolicy::Fail => provider,
            FallbackPolicy::Placeholder => Arc::new(PlaceholderFallback::new(provider)),
        };
        Self {
            editor: Arc::new(Mutex::new(editor)),
            provider,
            timeout,
            abort: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a closure against the editor
    pub fn read<R>(&self, f: impl FnOnce(&Editor) -> R) -> R {
        f(&self.editor.lock())
    }

    /// Copy of the current document
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.editor.lock().document().clone()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.editor.lock().phase()
    }

    /// Subscribe to orchestrator transitions
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.editor.lock().subscribe()
    }

    /// See [`Editor::select_field`]
    ///
    /// # Errors
    /// [`EditorError::UnknownField`].
    pub fn select_field(&self, id: &FieldId) -> Result<(), EditorError> {
        self.editor.lock().select_field(id)
    }

    /// See [`Editor::switch_active_task`]
    ///
    /// # Errors
    /// [`EditorError::UnknownTask`].
    pub fn switch_active_task(&self, id: &TaskId) -> Result<(), EditorError> {
        self.editor.lock().switch_active_task(id)
    }

    /// See [`Editor::request_row_regeneration`]
    ///
    /// # Errors
    /// As the editor operation.
    pub fn request_row_regeneration(&self, row: &RowId) -> Result<(), EditorError> {
        self.editor.lock().request_row_regeneration(row)
    }

    /// See [`Editor::request_page_regeneration`]
    ///
    /// # Errors
    /// As the editor operation.
    pub fn request_page_regeneration(&self, task: &TaskId) -> Result<(), EditorError> {
        self.editor.lock().request_page_regeneration(task)
    }

    /// See [`Editor::cancel_regeneration`]
    ///
    /// # Errors
    /// As the editor operation.
    pub fn cancel_regeneration(&self) -> Result<(), EditorError> {
        self.editor.lock().cancel_regeneration()
    }

    /// See [`Editor::resolve_cascade`]
    pub fn resolve_cascade(&self) -> Option<ResolveReport> {
        self.editor.lock().resolve_cascade()
    }

    /// Confirm the instruction, call the provider and apply the outcome
    ///
    /// Provider failures, timeouts and aborts come back as
    /// [`GenerationOutcome::Failed`]; the request then stays open for retry.
    ///
    /// # Errors
    /// Precondition violations from [`Editor::begin_regeneration`].
    pub async fn confirm_regeneration(&self, instruction: &str) -> Result<GenerationOutcome, EditorError> {
        let (pending, abort_rx) = {
            let mut editor = self.editor.lock();
            let pending = editor.begin_regeneration(instruction)?;
            let (abort_tx, abort_rx) = oneshot::channel();
            *self.abort.lock() = Some(abort_tx);
            (pending, abort_rx)
        };

        let guard = InFlight {
            editor: Arc::clone(&self.editor),
            abort: Arc::clone(&self.abort),
            id: pending.id,
            armed: true,
        };
        let result = self.call_provider(&pending.request, abort_rx).await;
        guard.disarm();

        let elapsed = chrono::Utc::now() - pending.started_at;
        tracing::debug!(
            request = %pending.id,
            elapsed_ms = elapsed.num_milliseconds(),
            ok = result.is_ok(),
            "provider call finished"
        );
        self.editor.lock().complete_regeneration(pending.id, result)
    }

    /// Abort the running provider call
    ///
    /// Returns `false` when no call is running.
    pub fn abort(&self) -> bool {
        match self.abort.lock().take() {
            Some(abort_tx) => abort_tx.send(()).is_ok(),
            None => false,
        }
    }

    async fn call_provider(
        &self,
        request: &GenerateRequest,
        abort_rx: oneshot::Receiver<()>,
    ) -> Result<String, ProviderError> {
        tokio::select! {
            Ok(()) = abort_rx => Err(ProviderError::Cancelled),
            result = self.provider.generate(request) => result,
        }
    }
}
