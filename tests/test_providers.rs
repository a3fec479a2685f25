//! Generation backend contract tests
//!
//! Tests behavioral contracts of the HTTP providers against a mock server:
//! request/response handling, error status mapping, token usage tracking,
//! and timeout enforcement.

use chatpipe::llm::provider::{
    CompletionRequest, FinishReason, LlmError, LlmProvider, Message, MessageRole,
};
use chatpipe::llm::providers::{
    AnthropicConfig, AnthropicProvider, OllamaConfig, OllamaProvider,
};
use chatpipe::pipeline::{GenerationSettings, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ollama_config(base_url: &str) -> OllamaConfig {
    OllamaConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn anthropic_config(base_url: &str) -> AnthropicConfig {
    AnthropicConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        version: "2023-06-01".to_string(),
    }
}

fn request(model: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }],
        model: model.to_string(),
        max_tokens: Some(100),
        temperature: Some(0.3),
    }
}

fn ollama_success_body() -> serde_json::Value {
    serde_json::json!({
        "model": "mistral",
        "created_at": "2024-05-01T12:34:56Z",
        "response": "The answer is 90.",
        "done": true,
        "done_reason": "stop",
        "prompt_eval_count": 25,
        "eval_count": 8
    })
}

#[tokio::test]
async fn test_ollama_returns_completion_with_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "mistral",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_success_body()))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    let response = provider.complete(request("mistral")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("The answer is 90."));
    assert_eq!(response.model, "mistral");
    assert_eq!(response.usage.prompt_tokens, 25);
    assert_eq!(response.usage.completion_tokens, 8);
    assert_eq!(response.usage.total_tokens, 33);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_ollama_tolerates_missing_token_counts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "mistral",
            "response": "hi",
            "done": true,
            "done_reason": null
        })))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    let response = provider.complete(request("mistral")).await.unwrap();

    assert_eq!(response.usage.total_tokens, 0);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_ollama_maps_api_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("model failed to load"),
        )
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    let result = provider.complete(request("mistral")).await;

    match result {
        Err(LlmError::ApiError(message)) => assert!(message.contains("model failed to load")),
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_rejects_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    let result = provider.complete(request("mistral")).await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_ollama_enforces_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ollama_success_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(OllamaConfig {
        base_url: mock_server.uri(),
        timeout: Duration::from_secs(1),
    })
    .unwrap();

    let result = provider.complete(request("mistral")).await;
    assert!(matches!(result, Err(LlmError::Timeout(1))));
}

#[tokio::test]
async fn test_ollama_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})),
        )
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_ok());
}

#[tokio::test]
async fn test_ollama_health_check_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_err());
}

#[tokio::test]
async fn test_anthropic_returns_completion_with_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Hello! "},
                {"type": "text", "text": "How can I help?"}
            ],
            "model": "claude-3-5-haiku-20241022",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 15}
        })))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new(anthropic_config(&mock_server.uri())).unwrap();
    let response = provider
        .complete(request("claude-3-5-haiku-20241022"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("Hello! How can I help?"));
    assert_eq!(response.usage.total_tokens, 25);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_anthropic_maps_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new(anthropic_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(request("claude-3-5-haiku-20241022"))
        .await;

    assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_anthropic_maps_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new(anthropic_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(request("claude-3-5-haiku-20241022"))
        .await;

    assert!(matches!(result, Err(LlmError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_anthropic_rejects_empty_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [],
            "model": "claude-3-5-haiku-20241022",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 0}
        })))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new(anthropic_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(request("claude-3-5-haiku-20241022"))
        .await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_pipeline_end_to_end_against_ollama_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_success_body()))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(ollama_config(&mock_server.uri())).unwrap();
    let pipeline = Pipeline::new(Arc::new(provider), GenerationSettings::default());

    let record = pipeline.run("Calculate 15 + 25 * 3").await;
    let report = record.result.unwrap();

    assert!(report.contains("Mathematical Solution:\nThe answer is 90."));
    assert_eq!(record.transitions, vec!["router -> math", "math -> final"]);
}
