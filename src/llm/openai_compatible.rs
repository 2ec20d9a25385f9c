// ABOUTME: Text generation backend for any OpenAI-compatible chat completions endpoint
// ABOUTME: Works with hosted APIs and local servers such as Ollama, vLLM, and LocalAI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # `OpenAI`-Compatible Backend
//!
//! Configured through `LlmConfig` (see `FASTWELL_LLM_BASE_URL`,
//! `FASTWELL_LLM_MODEL` and `FASTWELL_LLM_API_KEY`). Requests ask for a JSON
//! object response when the prompt says so; servers that ignore the hint
//! still work because the parser is lenient.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, PromptSpec, TextGenerationBackend};
use crate::config::LlmConfig;
use crate::errors::AdviceError;

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Backend Implementation
// ============================================================================

/// Chat completions client
pub struct OpenAiCompatibleBackend {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleBackend {
    /// Create a backend for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: LlmConfig) -> Result<Self, AdviceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AdviceError::GenerationUnavailable(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// Endpoint configuration
    #[must_use]
    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    fn parse_error_response(status: StatusCode, body: &str) -> AdviceError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());
            let message = match status.as_u16() {
                401 | 403 => format!("authentication failed: {}", error_response.error.message),
                404 => format!("model or endpoint not found: {}", error_response.error.message),
                429 => format!("rate limited: {}", error_response.error.message),
                _ => format!("{error_type} - {}", error_response.error.message),
            };
            AdviceError::GenerationUnavailable(message)
        } else {
            match status.as_u16() {
                502..=504 => AdviceError::GenerationUnavailable(
                    "generation server is not responding".to_owned(),
                ),
                _ => AdviceError::GenerationUnavailable(format!(
                    "API error ({status}): {}",
                    body.chars().take(200).collect::<String>()
                )),
            }
        }
    }
}

#[async_trait]
impl TextGenerationBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model, advice.type = %prompt.advice_type))]
    async fn generate(&self, prompt: &PromptSpec) -> Result<String, AdviceError> {
        let request = OpenAiRequest {
            model: &self.config.model,
            messages: prompt.messages().iter().map(OpenAiMessage::from).collect(),
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
            stream: false,
            response_format: prompt.json_response.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&request);

        let response = self.add_auth_header(http_request).send().await.map_err(|e| {
            error!(error = %e, base_url = %self.config.base_url, "generation request failed");
            if e.is_connect() {
                AdviceError::GenerationUnavailable(format!(
                    "cannot connect to {}",
                    self.config.base_url
                ))
            } else if e.is_timeout() {
                AdviceError::Timeout {
                    stage: "generation",
                    after_ms: self.config.request_timeout_secs.saturating_mul(1000),
                }
            } else {
                AdviceError::GenerationUnavailable(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AdviceError::GenerationUnavailable(format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            AdviceError::GenerationUnavailable(format!("malformed completion envelope: {e}"))
        })?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            AdviceError::GenerationUnavailable("API returned no choices".to_owned())
        })?;

        debug!(
            model = ?parsed.model,
            finish_reason = ?choice.finish_reason,
            content_len = choice.message.content.as_ref().map(String::len),
            "completion received"
        );

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AdviceError::GenerationParse("completion had no content".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_gateway_errors_read_as_unavailable() {
        let err = OpenAiCompatibleBackend::parse_error_response(StatusCode::BAD_GATEWAY, "<html>");
        assert!(err.is_unavailable());
    }

    #[test]
    fn json_errors_keep_the_server_message() {
        let body = r#"{"error":{"message":"model missing","type":"invalid_request_error"}}"#;
        let err = OpenAiCompatibleBackend::parse_error_response(StatusCode::NOT_FOUND, body);
        assert!(err.to_string().contains("model missing"));
    }
}
