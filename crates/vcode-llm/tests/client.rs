//! Integration tests for `ChatCompletionsClient` using wiremock HTTP mocks.

use vcode_llm::{ChatCompletionsClient, CompletionOptions, CompletionService, LlmError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ChatCompletionsClient {
    ChatCompletionsClient::with_base_url("test-key", "test-model", 30, base_url)
        .expect("client construction should not fail")
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn complete_returns_message_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "messages": [
                { "role": "system", "content": "be terse" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{\"codeframe\": []}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client
        .complete("be terse", "hello", &CompletionOptions::default())
        .await
        .expect("should return content");

    assert_eq!(text, "{\"codeframe\": []}");
}

#[tokio::test]
async fn complete_sends_options_when_set() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "max_tokens": 512,
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let options = CompletionOptions {
        temperature: Some(0.2),
        max_tokens: Some(512),
        json_mode: true,
    };
    let text = client
        .complete("s", "u", &options)
        .await
        .expect("should match the option-bearing request");
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn complete_maps_rate_limit_to_transient_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "Rate limit reached" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .complete("s", "u", &CompletionOptions::default())
        .await
        .expect_err("429 should be an error");

    match &err {
        LlmError::Api { status, message } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "Rate limit reached");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn complete_maps_unauthorized_to_permanent_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .complete("s", "u", &CompletionOptions::default())
        .await
        .expect_err("401 should be an error");

    assert!(matches!(err, LlmError::Api { status: 401, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn complete_rejects_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .complete("s", "u", &CompletionOptions::default())
        .await
        .expect_err("empty choices should be an error");

    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn complete_reports_unparsable_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .complete("s", "u", &CompletionOptions::default())
        .await
        .expect_err("non-JSON body should be an error");

    assert!(matches!(err, LlmError::Deserialize { .. }));
}
