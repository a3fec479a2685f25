//! Ollama provider implementation
//!
//! Talks to a local Ollama daemon over its `/api/generate` endpoint. This
//! is the default backend: it needs no API key and works against any model
//! the daemon has pulled.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, MessageRole,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Ollama provider implementation
pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        if config.base_url.is_empty() {
            return Err(LlmError::NotConfigured(
                "Ollama base URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Flatten chat messages into Ollama's prompt/system pair
    ///
    /// `/api/generate` takes a single prompt string; system messages map to
    /// the `system` field, everything else is concatenated in order.
    fn convert_messages(&self, request: &CompletionRequest) -> (Option<String>, String) {
        let mut system = None;
        let mut parts = Vec::new();

        for message in &request.messages {
            match message.role {
                MessageRole::System => system = Some(message.content.clone()),
                MessageRole::User | MessageRole::Assistant => parts.push(message.content.as_str()),
            }
        }

        (system, parts.join("\n"))
    }

    fn convert_done_reason(&self, reason: Option<&str>, done: bool) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            None if done => FinishReason::Stop,
            _ => FinishReason::Error,
        }
    }

    fn map_request_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.config.timeout.as_secs())
        } else {
            LlmError::NetworkError(error.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (system, prompt) = self.convert_messages(&request);

        let ollama_request = OllamaGenerateRequest {
            model: request.model.clone(),
            prompt,
            system,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!(
                "Ollama API error: {status} - {error_text}"
            )));
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let prompt_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = ollama_response.eval_count.unwrap_or(0);
        let usage = TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        };

        let finish_reason =
            self.convert_done_reason(ollama_response.done_reason.as_deref(), ollama_response.done);

        Ok(CompletionResponse {
            content: Some(ollama_response.response),
            model: ollama_response.model,
            usage,
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        // The daemon lists local models cheaply; a 200 means it is up
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::ApiError(format!(
                "Ollama daemon unhealthy: {}",
                response.status()
            )))
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
    done: bool,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}
