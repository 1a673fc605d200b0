//! Content provider contract
//!
//! The provider turns an instruction (plus the current content of the
//! target, when row-scoped) into replacement text. Implementations live
//! outside this crate; the HTTP one is in `lte-provider`.

use crate::error::ProviderError;
use crate::model::RowId;
use crate::orchestrator::Scope;
use async_trait::async_trait;
use serde::Serialize;

/// Request handed to a provider
///
/// `target_row_id` and `is_full_scope` are mutually exclusive; build it
/// with [`GenerateRequest::for_scope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// User instruction, non-empty
    pub instruction: String,
    /// Row being regenerated (row scope)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_row_id: Option<RowId>,
    /// Whole-task regeneration (page scope)
    pub is_full_scope: bool,
    /// Current content of the target, for the provider's reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl GenerateRequest {
    /// Build a request for a captured scope
    #[must_use]
    pub fn for_scope(instruction: impl Into<String>, scope: &Scope) -> Self {
        Self {
            instruction: instruction.into(),
            target_row_id: scope.row().cloned(),
            is_full_scope: scope.is_full_scope(),
            context: None,
        }
    }

    /// With reference content
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// External content generation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Produce replacement text for a request
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError>;
}

/// Trim provider output and reject empty text
///
/// # Errors
/// [`ProviderError::EmptyResponse`] when nothing but whitespace remains.
pub fn sanitize_response(text: &str) -> Result<String, ProviderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Placeholder acknowledgment echoing the instruction
#[must_use]
pub fn placeholder_text(instruction: &str) -> String {
    format!(
        "[Generated draft] Following your request \"{}\", this section was revised to stress \
         safe, standard operating practice and to align with current industry standards.",
        instruction.trim()
    )
}

/// Substitutes placeholder text when the inner provider fails
///
/// Demo builds only: production callers surface the failure instead.
#[derive(Debug, Clone)]
pub struct PlaceholderFallback<P> {
    inner: P,
}

impl<P> PlaceholderFallback<P> {
    /// Wrap a provider
    #[inline]
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Inner provider
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ContentProvider> ContentProvider for PlaceholderFallback<P> {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        match self.inner.generate(request).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                tracing::warn!("empty response, using placeholder");
                Ok(placeholder_text(&request.instruction))
            }
            Err(error) => {
                tracing::warn!(%error, "provider failed, using placeholder");
                Ok(placeholder_text(&request.instruction))
            }
        }
    }
}

#[async_trait]
impl<P: ContentProvider + ?Sized> ContentProvider for std::sync::Arc<P> {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        (**self).generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskId;

    fn row_request() -> GenerateRequest {
        let scope = Scope::Row {
            task: TaskId::new("t1"),
            row: RowId::new("r1"),
        };
        GenerateRequest::for_scope("add safety steps", &scope)
    }

    #[test]
    fn scopes_are_mutually_exclusive() {
        let row = row_request();
        assert_eq!(row.target_row_id, Some(RowId::new("r1")));
        assert!(!row.is_full_scope);

        let page = GenerateRequest::for_scope("x", &Scope::Page { task: TaskId::new("t1") });
        assert!(page.target_row_id.is_none());
        assert!(page.is_full_scope);
    }

    #[test]
    fn request_serializes_camel_case() {
        let json = serde_json::to_value(row_request().with_context("draft")).unwrap();
        assert_eq!(json["targetRowId"], "r1");
        assert_eq!(json["isFullScope"], false);
        assert_eq!(json["context"], "draft");
    }

    #[test]
    fn sanitize_trims_and_rejects_blank() {
        assert_eq!(sanitize_response("  text \n").unwrap(), "text");
        assert_eq!(sanitize_response(" \n "), Err(ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn fallback_substitutes_on_error() {
        let mut inner = MockContentProvider::new();
        inner
            .expect_generate()
            .returning(|_| Err(ProviderError::Transport("offline".into())));

        let provider = PlaceholderFallback::new(inner);
        let text = provider.generate(&row_request()).await.unwrap();
        assert!(text.contains("add safety steps"));
    }

    #[tokio::test]
    async fn fallback_passes_through_success() {
        let mut inner = MockContentProvider::new();
        inner.expect_generate().returning(|_| Ok("revised".into()));

        let provider = PlaceholderFallback::new(inner);
        assert_eq!(provider.generate(&row_request()).await.unwrap(), "revised");
    }
}
