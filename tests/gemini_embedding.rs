#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for the Gemini embedding client against a mock server
// The client is blocking, so its calls run on a blocking task while the
// mock server is served by the runtime's worker threads

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use askdocs::config::GeminiConfig;
use askdocs::embeddings::GeminiClient;

const DIM: u32 = 4;

fn config_for(server_uri: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: "test-key".to_string(),
        endpoint: server_uri.to_string(),
        embedding_model: "models/embedding-001".to_string(),
        chat_model: "models/gemini-1.5-flash-8b".to_string(),
        embedding_dimension: DIM,
    }
}

fn embedding_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "embedding": { "values": [0.1, 0.2, 0.3, 0.4] }
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_chunk_is_skipped_and_batch_proceeds() {
    let server = MockServer::start().await;

    // One poisoned chunk fails outright; everything else embeds fine
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .and(body_string_contains("poison chunk"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(embedding_response())
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server.uri())).expect("client should build");
    let chunks = vec![
        "first chunk".to_string(),
        "poison chunk".to_string(),
        "third chunk".to_string(),
    ];

    let (vectors, progressed) = tokio::task::spawn_blocking(move || {
        let mut progressed = 0usize;
        let vectors = client.embed_document_chunks(&chunks, |_| progressed += 1);
        (vectors, progressed)
    })
    .await
    .expect("embedding task should finish");

    // The failed chunk is dropped, the survivors keep their order, and the
    // progress callback still fired for every attempted chunk
    assert_eq!(vectors.len(), 2);
    assert!(vectors.iter().all(|v| *v == [0.1, 0.2, 0.3, 0.4]));
    assert_eq!(progressed, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn all_chunks_failing_yields_empty_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server.uri())).expect("client should build");
    let chunks = vec!["only chunk".to_string()];

    let vectors =
        tokio::task::spawn_blocking(move || client.embed_document_chunks(&chunks, |_| {}))
            .await
            .expect("embedding task should finish");

    assert!(vectors.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_retried() {
    let server = MockServer::start().await;

    // First request gets a 500, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(embedding_response())
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server.uri()))
        .expect("client should build")
        .with_retry_attempts(2);

    let vector = tokio::task::spawn_blocking(move || client.embed_document_chunk("retry me"))
        .await
        .expect("embedding task should finish")
        .expect("retry should succeed");

    assert_eq!(vector.len(), DIM as usize);
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_dimension_from_api_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": { "values": [0.1, 0.2] }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server.uri())).expect("client should build");

    let result = tokio::task::spawn_blocking(move || client.embed_query("short vector"))
        .await
        .expect("embedding task should finish");

    assert!(result.is_err());
}
