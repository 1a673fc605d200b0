//! Gemini provider configuration

use lte_core::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variables consulted for the API key, in order
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert vocational curriculum developer. \
Improve or generate course content as the user asks. Answer in plain text without Markdown.";

const DEFAULT_ROW_INSTRUCTION: &str =
    "You are regenerating a single row of the teaching table. Stay professional and accurate.";

/// Gemini provider configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiConfig {
    /// API base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key; falls back to [`API_KEY_VARS`]
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// System instruction for every request
    pub system_instruction: String,
    /// Appended to the system instruction for row-scoped requests
    pub row_instruction: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            temperature: 0.7,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            row_instruction: DEFAULT_ROW_INSTRUCTION.to_string(),
            http_timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// HTTP client timeout
    #[inline]
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Configured key, else the first non-empty environment variable
    ///
    /// # Errors
    /// [`ProviderError::Config`] when no key is available.
    pub fn resolve_api_key(&self) -> Result<String, ProviderError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ProviderError> {
        self.api_key
            .clone()
            .into_iter()
            .chain(API_KEY_VARS.iter().filter_map(|name| lookup(name)))
            .find(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Config(format!(
                    "no API key configured; set api_key or one of {}",
                    API_KEY_VARS.join(", ")
                ))
            })
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ProviderError::Config`] on an empty model or a temperature
    /// outside `0.0..=2.0`.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::Config(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}
