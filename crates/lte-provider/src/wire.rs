//! `generateContent` request and response bodies

use crate::config::GeminiConfig;
use lte_core::{GenerateRequest, ProviderError};
use serde::{Deserialize, Serialize};

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentBody {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub generation_config: GenerationConfig,
}

/// One turn of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Text part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// User prompt: the instruction, preceded by the current content if any
#[must_use]
pub fn prompt_text(request: &GenerateRequest) -> String {
    match request.context.as_deref().map(str::trim) {
        Some(context) if !context.is_empty() => {
            format!("Current content:\n{context}\n\nRequest:\n{}", request.instruction)
        }
        _ => request.instruction.clone(),
    }
}

/// Build the request body
#[must_use]
pub fn build_body(config: &GeminiConfig, request: &GenerateRequest) -> GenerateContentBody {
    let mut system = config.system_instruction.clone();
    if request.target_row_id.is_some() && !config.row_instruction.is_empty() {
        system.push(' ');
        system.push_str(&config.row_instruction);
    }
    GenerateContentBody {
        contents: vec![Content::text(Some("user"), prompt_text(request))],
        system_instruction: Content::text(None, system),
        generation_config: GenerationConfig {
            temperature: config.temperature,
        },
    }
}

/// Concatenated text of the first candidate
///
/// # Errors
/// [`ProviderError::Malformed`] if the body is not a response,
/// [`ProviderError::EmptyResponse`] if it carries no text.
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::Malformed(format!("prompt blocked: {reason}")));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Map an error status and body to a provider error
#[must_use]
pub fn parse_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect());
    ProviderError::Status { status, message }
}
