//! Integration tests for the resource services and paging.

use std::sync::Arc;

use futures::StreamExt;
use integrations_genai::error::{GenAiError, RequestError};
use integrations_genai::mocks::{MockAuthManager, MockHttpTransport};
use integrations_genai::transport::HttpMethod;
use integrations_genai::types::{
    CountTokensRequest, CreateCachedContentRequest, GenerateContentRequest, ListParams, SafetySetting,
    UpdateCachedContentRequest,
};
use integrations_genai::{Backend, GenAiClient, GenAiClientBuilder};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{json, Value};

fn direct(transport: Arc<MockHttpTransport>) -> GenAiClient {
    GenAiClientBuilder::new()
        .api_key(SecretString::new("test-key".into()))
        .transport(transport)
        .build()
        .unwrap()
}

fn project_scoped(transport: Arc<MockHttpTransport>) -> GenAiClient {
    GenAiClientBuilder::new()
        .backend(Backend::ProjectScoped)
        .project("my-project")
        .location("us-central1")
        .auth(Arc::new(MockAuthManager::new()))
        .transport(transport)
        .build()
        .unwrap()
}

fn body(transport: &MockHttpTransport, index: usize) -> Value {
    let request = &transport.get_requests()[index];
    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
}

#[tokio::test]
async fn test_generate_content_direct() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(
        200,
        &json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hi there" }] }, "finishReason": "STOP" }],
            "usageMetadata": { "promptTokenCount": 2, "candidatesTokenCount": 3, "totalTokenCount": 5 }
        }),
    );
    let client = direct(transport.clone());

    // Act
    let response = client
        .models()
        .generate_content("gemini-pro", GenerateContentRequest::new(vec!["Hello".into()]))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.text().as_deref(), Some("Hi there"));
    transport.verify_request(0, HttpMethod::Post, "/v1beta/models/gemini-pro:generateContent");
    transport.verify_header(0, "x-goog-api-key", "test-key");
    assert_eq!(body(&transport, 0)["contents"][0]["role"], "user");
}

#[tokio::test]
async fn test_generate_content_project_scoped() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &json!({ "candidates": [] }));
    let client = project_scoped(transport.clone());

    client
        .models()
        .generate_content("gemini-pro", GenerateContentRequest::new(vec!["Hello".into()]))
        .await
        .unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(
        request.url,
        "https://us-central1-aiplatform.googleapis.com/v1beta1/projects/my-project/locations/us-central1/publishers/google/models/gemini-pro:generateContent"
    );
    transport.verify_header(0, "Authorization", "Bearer test-token");
    assert!(!request.headers.contains_key("x-goog-api-key"));
}

#[tokio::test]
async fn test_safety_method_only_on_project_scoped() {
    let request = GenerateContentRequest {
        safety_settings: Some(vec![
            SafetySetting::new("HARM_CATEGORY_HATE_SPEECH", "BLOCK_ONLY_HIGH").with_method("SEVERITY"),
        ]),
        ..GenerateContentRequest::new(vec!["Hello".into()])
    };

    let direct_transport = Arc::new(MockHttpTransport::new());
    let rejected = direct(direct_transport.clone())
        .models()
        .generate_content("gemini-pro", request.clone())
        .await;
    assert!(matches!(
        rejected,
        Err(GenAiError::Request(RequestError::InvalidParameter { .. }))
    ));
    direct_transport.verify_request_count(0);

    let scoped_transport = Arc::new(MockHttpTransport::new());
    scoped_transport.enqueue_json_response(200, &json!({ "candidates": [] }));
    project_scoped(scoped_transport.clone())
        .models()
        .generate_content("gemini-pro", request)
        .await
        .unwrap();
    assert_eq!(body(&scoped_transport, 0)["safetySettings"][0]["method"], "SEVERITY");
}

#[tokio::test]
async fn test_count_tokens() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &json!({ "totalTokens": 7 }));
    let client = direct(transport.clone());

    let response = client
        .models()
        .count_tokens(
            "models/gemini-pro",
            CountTokensRequest {
                contents: Some(vec!["How many tokens?".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(response.total_tokens, 7);
    transport.verify_request(0, HttpMethod::Post, "/v1beta/models/gemini-pro:countTokens");
}

#[tokio::test]
async fn test_client_error_is_classified() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(
        404,
        &json!({ "error": { "code": 404, "message": "not found", "status": "NOT_FOUND" } }),
    );
    let client = direct(transport);

    let error = client.models().get("nope").await.unwrap_err();

    assert!(matches!(error, GenAiError::Client(_)));
    assert_eq!(error.status(), Some(404));
    assert!(error.body().unwrap().contains("NOT_FOUND"));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_list_models_pages_until_cursor_runs_out() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(
        200,
        &json!({ "models": [{ "name": "models/a" }, { "name": "models/b" }], "nextPageToken": "t2" }),
    );
    transport.enqueue_json_response(200, &json!({ "models": [{ "name": "models/c" }], "nextPageToken": "" }));
    let client = direct(transport.clone());

    // Act
    let pager = client
        .models()
        .list(Some(ListParams::with_page_size(2)))
        .await
        .unwrap();
    assert_eq!(pager.page_size(), 2);
    let names: Vec<String> = pager.into_stream().map(|m| m.unwrap().name).collect().await;

    // Assert
    assert_eq!(names, vec!["models/a", "models/b", "models/c"]);
    transport.verify_request_count(2);
    let first = &transport.get_requests()[0].url;
    let second = &transport.get_requests()[1].url;
    assert_eq!(first, "https://generativelanguage.googleapis.com/v1beta/models?pageSize=2");
    assert_eq!(
        second,
        "https://generativelanguage.googleapis.com/v1beta/models?pageSize=2&pageToken=t2"
    );
}

#[tokio::test]
async fn test_next_page_without_cursor_fails() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &json!({ "cachedContents": [{ "name": "cachedContents/x" }] }));
    let client = direct(transport.clone());

    let mut pager = client.caches().list(None).await.unwrap();

    assert_eq!(pager.page().len(), 1);
    assert!(!pager.has_next_page());
    let result = pager.next_page().await;
    assert!(matches!(
        result,
        Err(GenAiError::Request(RequestError::InvalidParameter { .. }))
    ));
    transport.verify_request_count(1);
}

#[tokio::test]
async fn test_list_models_project_scoped_path() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &json!({}));
    let client = project_scoped(transport.clone());

    let pager = client.models().list(None).await.unwrap();

    assert!(pager.page().is_empty());
    assert_eq!(
        transport.last_request().unwrap().url,
        "https://us-central1-aiplatform.googleapis.com/v1beta1/publishers/google/models"
    );
}

#[tokio::test]
async fn test_files_unavailable_on_project_scoped() {
    let transport = Arc::new(MockHttpTransport::new());
    let client = project_scoped(transport.clone());

    let get = client.files().get("abc").await;
    let list = client.files().list(None).await;
    let delete = client.files().delete("abc").await;

    for result in [get.map(|_| ()), list.map(|_| ()), delete] {
        assert!(matches!(
            result,
            Err(GenAiError::Request(RequestError::UnsupportedOperation { .. }))
        ));
    }
    transport.verify_request_count(0);
}

#[tokio::test]
async fn test_cache_lifecycle_project_scoped() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let cache_name = "projects/my-project/locations/us-central1/cachedContents/c1";
    transport.enqueue_json_response(200, &json!({ "name": cache_name }));
    transport.enqueue_json_response(200, &json!({ "name": cache_name, "expireTime": "2030-01-01T00:00:00Z" }));
    transport.enqueue_json_response(200, &json!({}));
    let client = project_scoped(transport.clone());

    // Act
    let created = client
        .caches()
        .create(CreateCachedContentRequest {
            model: "gemini-pro".to_string(),
            contents: vec!["Long document".into()],
            ttl: Some("3600s".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let updated = client
        .caches()
        .update(
            "c1",
            UpdateCachedContentRequest {
                ttl: Some("60s".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    client.caches().delete("cachedContents/c1").await.unwrap();

    // Assert
    assert_eq!(created.name.as_deref(), Some(cache_name));
    assert!(updated.expire_time.is_some());
    assert_eq!(
        body(&transport, 0)["model"],
        "projects/my-project/locations/us-central1/publishers/google/models/gemini-pro"
    );
    transport.verify_request(0, HttpMethod::Post, "/v1beta1/projects/my-project/locations/us-central1/cachedContents");
    transport.verify_request(1, HttpMethod::Patch, "/v1beta1/projects/my-project/locations/us-central1/cachedContents/c1");
    transport.verify_request(2, HttpMethod::Delete, "/v1beta1/projects/my-project/locations/us-central1/cachedContents/c1");
}

#[tokio::test]
async fn test_cache_get_direct() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &json!({ "name": "cachedContents/c1", "model": "models/gemini-pro" }));
    let client = direct(transport.clone());

    let cache = client.caches().get("c1").await.unwrap();

    assert_eq!(cache.model.as_deref(), Some("models/gemini-pro"));
    assert_eq!(
        transport.last_request().unwrap().url,
        "https://generativelanguage.googleapis.com/v1beta/cachedContents/c1"
    );
}
