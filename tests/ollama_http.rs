//! OllamaClient against a local HTTP mock server
//!
//! Exercises the wire format (paths, request bodies, both listing shapes,
//! NDJSON pull streaming, error payloads) without a running Ollama.

use feature_gen::gateway::{
    ChatMessage, ChatRequest, GatewayError, GenerateRequest, GenerationReply, ModelGateway,
    ModelService, OllamaClient, PullStatus,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NDJSON: &str = "application/x-ndjson";

async fn client_for(server: &MockServer) -> OllamaClient {
    OllamaClient::with_timeouts(
        server.uri(),
        Some(Duration::from_secs(10)),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_health_and_listing_wrapped_shape() {
    let server = MockServer::start().await;
    let listing = json!({
        "models": [
            {
                "name": "llava:latest",
                "size": 4_700_000_000u64,
                "modified_at": "2024-05-01T10:00:00Z"
            },
            {"name": "llama3:latest", "size": 4_661_224_676u64}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Arc::new(client_for(&server).await));

    assert!(gateway.check_health().await);
    let models = gateway.list_models().await;
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "llava:latest");
    assert!(gateway.model_exists("llama3").await);
    assert!(!gateway.model_exists("mistral").await);
}

#[tokio::test]
async fn test_listing_bare_array_shape() {
    let server = MockServer::start().await;
    let listing = json!([{"model": "llava:13b", "size": 8}]);
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let models = client.list_models().await.unwrap().into_models();
    assert_eq!(models[0].name, "llava:13b");
    assert_eq!(models[0].size, 8);
}

#[tokio::test]
async fn test_unhealthy_status_and_empty_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Arc::new(client_for(&server).await));
    assert!(!gateway.check_health().await);
    assert!(gateway.list_models().await.is_empty());
}

#[tokio::test]
async fn test_pull_streams_ndjson_status() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"status\":\"pulling manifest\"}\n",
        "{\"status\":\"downloading\",\"digest\":\"sha256:abc\",\"total\":100,\"completed\":40}\n",
        "{\"status\":\"success\"}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({"model": "llava", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, NDJSON))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut statuses = Vec::new();
    client
        .pull("llava", &mut |s: PullStatus| statuses.push(s))
        .await
        .unwrap();

    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[1].completed, Some(40));
    assert_eq!(statuses[1].total, Some(100));
    assert_eq!(statuses[2].status, "success");
}

#[tokio::test]
async fn test_pull_error_line_fails() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"status\":\"pulling manifest\"}\n",
        "{\"error\":\"pull model manifest: file does not exist\"}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, NDJSON))
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(Arc::new(client_for(&server).await));
    assert!(!gateway.pull_model("nope").await);
}

#[tokio::test]
async fn test_chat_reply_and_system_message() {
    let server = MockServer::start().await;
    let reply = json!({
        "model": "llama3:latest",
        "message": {"role": "assistant", "content": "# Requirements"},
        "done": true
    });
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3:latest", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let reply = client
        .chat(ChatRequest::new(
            "llama3:latest",
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
        ))
        .await
        .unwrap();
    assert_eq!(reply, GenerationReply::Chat("# Requirements".to_string()));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn test_generate_reply_with_image() {
    let server = MockServer::start().await;
    let reply = json!({
        "model": "llava:latest",
        "response": "A login form",
        "done": true
    });
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"images": ["aGVsbG8="]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = GenerateRequest::new("llava:latest", "describe")
        .with_image("aGVsbG8=".to_string());
    let reply = client
        .generate(request)
        .await
        .unwrap();
    assert_eq!(reply.into_text(), "A login form");
}

#[tokio::test]
async fn test_error_payload_becomes_api_error() {
    let server = MockServer::start().await;
    let missing = json!({"error": "model 'ghost' not found"});
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(missing))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .chat(ChatRequest::new("ghost", vec![ChatMessage::user("hi")]))
        .await
        .unwrap_err();

    match err {
        GatewayError::Api { status, message } => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "model 'ghost' not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_image_analysis_falls_back_to_generate() {
    let server = MockServer::start().await;
    let listing = json!({"models": [{"name": "llava:latest"}]});
    let reply = json!({"response": "UI Components:\n- Button"});
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("no chat"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let mut image = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    image.write_all(b"\x89PNG").unwrap();

    let gateway = ModelGateway::new(Arc::new(client_for(&server).await));
    let text = gateway
        .analyze_image(image.path(), "llava", "describe")
        .await
        .unwrap();
    assert_eq!(text, "UI Components:\n- Button");
}
