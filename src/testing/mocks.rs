//! Mock implementations for testing
//!
//! Provides a scripted generation backend so the pipeline and web boundary
//! can be tested without a running model daemon.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, MessageRole,
    TokenUsage,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Mock generation backend with scripted responses
///
/// Responses cycle in order; every prompt the backend sees is recorded for
/// assertions. `with_failure` builds a backend whose every call fails.
#[derive(Debug, Default)]
pub struct MockGenerationService {
    responses: Vec<String>,
    cursor: Mutex<usize>,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerationService {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Prompts observed so far, in call order
    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock state poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockGenerationService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().expect("mock state poisoned").push(prompt);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock generation failure".to_string()));
        }

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            let mut cursor = self.cursor.lock().expect("mock state poisoned");
            let index = *cursor % self.responses.len();
            *cursor += 1;
            self.responses[index].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
