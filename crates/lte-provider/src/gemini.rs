//! Gemini `generateContent` provider

use crate::config::GeminiConfig;
use crate::wire::{build_body, parse_error, parse_response};
use async_trait::async_trait;
use lte_core::{ContentProvider, GenerateRequest, ProviderError};
use tracing::{debug, warn};

/// Content provider backed by the Gemini REST API
pub struct GeminiProvider {
    config: GeminiConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Create provider
    ///
    /// # Errors
    /// [`ProviderError::Config`] on invalid configuration, a missing API key
    /// or an HTTP client that cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let api_key = config.resolve_api_key()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("lte/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// `generateContent` URL for the configured model
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn transport_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                duration_ms: self.config.http_timeout_secs.max(1) * 1000,
            }
        } else {
            ProviderError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        let url = self.url();
        let body = build_body(&self.config, request);
        debug!(model = %self.config.model, full_scope = request.is_full_scope, "calling generateContent");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let error = parse_error(status.as_u16(), &text);
            warn!(%status, %error, "generateContent failed");
            return Err(error);
        }
        parse_response(&text)
    }
}
