//! HTTP surface tests against mock extractors and an in-memory row store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use event_extraction::testing::{
    MockFetcher, MockFieldExtractor, MockImageOcr, MockPdfText, MockUrlSource,
};
use event_extraction::{
    Extractors, FieldSchema, MemoryRowStore, Orchestrator, QueuedUrl, RowStore, ScrapedPage,
    StoreError, StoreResult,
};
use serde_json::{json, Value};
use server_core::common::PendingRecords;
use server_core::kernel::ServerDeps;
use server_core::server::build_app;
use server_core::DEFAULT_MAX_BODY_BYTES;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryRowStore>,
}

fn test_deps(urls: MockUrlSource, fields: MockFieldExtractor, store: Arc<dyn RowStore>) -> ServerDeps {
    let orchestrator = Orchestrator::new(
        Extractors {
            url: Arc::new(urls),
            image: Arc::new(MockImageOcr::new()),
            pdf: Arc::new(MockPdfText::new()),
            fetcher: Arc::new(MockFetcher::new()),
            fields: Arc::new(fields),
        },
        Arc::new(FieldSchema::builtin()),
    );
    ServerDeps::new(
        orchestrator,
        store,
        PendingRecords::new(Duration::from_secs(60), 16),
    )
}

fn test_router(deps: ServerDeps) -> Router {
    build_app(deps, &["http://localhost:5000".to_string()], DEFAULT_MAX_BODY_BYTES)
}

fn test_app(urls: MockUrlSource, fields: MockFieldExtractor, store: MemoryRowStore) -> TestApp {
    let store = Arc::new(store);
    TestApp {
        router: test_router(test_deps(urls, fields, store.clone())),
        store,
    }
}

/// Memory store whose row deletes always fail.
struct FailingDeletes(Arc<MemoryRowStore>);

#[async_trait]
impl RowStore for FailingDeletes {
    async fn append_row(&self, sheet: &str, row: Vec<String>) -> StoreResult<()> {
        self.0.append_row(sheet, row).await
    }

    async fn delete_row(&self, _sheet: &str, _row_number: usize) -> StoreResult<()> {
        Err(StoreError::Backend("sheet is read-only".into()))
    }

    async fn queued_urls(&self, sheet: &str) -> StoreResult<Vec<QueuedUrl>> {
        self.0.queued_urls(sheet).await
    }
}

fn queue_of(urls: &[&str]) -> MemoryRowStore {
    let mut rows = vec![vec!["URL".to_string()]];
    rows.extend(urls.iter().map(|url| vec![url.to_string()]));
    MemoryRowStore::new().with_sheet("Queue", rows)
}

fn workshop_pages() -> (MockUrlSource, MockFieldExtractor) {
    let urls = MockUrlSource::new()
        .with_page(ScrapedPage::new("https://events.example/a", "Workshop A"))
        .with_page(ScrapedPage::new("https://events.example/b", "Workshop B"));
    let fields = MockFieldExtractor::new()
        .with_response("Workshop", json!({"שם_האירוע": "Workshop"}));
    (urls, fields)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app(MockUrlSource::new(), MockFieldExtractor::new(), MemoryRowStore::new());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn empty_run_is_bad_request() {
    let app = test_app(MockUrlSource::new(), MockFieldExtractor::new(), MemoryRowStore::new());

    let (status, body) = post_json(&app.router, "/run", json!({"text_input": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn run_then_confirm_writes_ledger_row() {
    let fields = MockFieldExtractor::new()
        .with_response("Meetup", json!({"שם_האירוע": "Rust Meetup", "תאריך": "05.06.25"}));
    let app = test_app(MockUrlSource::new(), fields, MemoryRowStore::new());

    let (status, body) =
        post_json(&app.router, "/run", json!({"text_input": "Rust Meetup on 05.06.25"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merged_record"]["שם_האירוע"], "Rust Meetup");
    assert_eq!(body["trace"][0]["source_type"], "text");
    assert_eq!(body["summary"]["count"], 1);

    let request_id = body["request_id"].as_str().unwrap().to_string();
    let (status, body) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let rows = app.store.rows("Events");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "text");
    assert!(rows[0].contains(&"Rust Meetup".to_string()));

    // A record is confirmed once.
    let (status, _) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_confirmation_is_not_found() {
    let app = test_app(MockUrlSource::new(), MockFieldExtractor::new(), MemoryRowStore::new());

    let (status, body) = send(
        &app.router,
        post("/confirm/00000000-0000-4000-8000-000000000000"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("No pending record"));
}

#[tokio::test]
async fn queue_next_processes_and_confirm_removes_row() {
    let urls = MockUrlSource::new().with_page(ScrapedPage::new(
        "https://events.example/queued",
        "Queued Workshop",
    ));
    let fields = MockFieldExtractor::new()
        .with_response("Workshop", json!({"שם_האירוע": "Workshop"}));
    let store = MemoryRowStore::new().with_sheet(
        "Queue",
        vec![
            vec!["URL".to_string()],
            vec!["https://events.example/queued".to_string()],
        ],
    );
    let app = test_app(urls, fields, store);

    let (status, body) = send(&app.router, post("/queue/next")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merged_record"]["שם_האירוע"], "Workshop");
    assert_eq!(body["trace"][0]["source_type"], "url");

    let request_id = body["request_id"].as_str().unwrap().to_string();
    let (status, _) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.store.rows("Queue").len(), 1, "Only the header remains");
    assert_eq!(app.store.rows("Events")[0][1], "https://events.example/queued");

    let (status, _) = send(&app.router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_queue_pulls_get_distinct_urls() {
    let (urls, fields) = workshop_pages();
    let app = test_app(
        urls,
        fields,
        queue_of(&["https://events.example/a", "https://events.example/b"]),
    );

    let (status, first) = send(&app.router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(&app.router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["trace"][0]["source_content"], "https://events.example/a");
    assert_eq!(second["trace"][0]["source_content"], "https://events.example/b");

    // Both URLs are claimed, so a third pull finds nothing to do.
    let (status, _) = send(&app.router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Confirm in reverse order so the first confirmation shifts no other row.
    for body in [&second, &first] {
        let request_id = body["request_id"].as_str().unwrap();
        let (status, _) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let sources: Vec<String> = app
        .store
        .rows("Events")
        .iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(
        sources,
        vec!["https://events.example/b", "https://events.example/a"]
    );
    assert_eq!(app.store.rows("Queue"), vec![vec!["URL".to_string()]]);
}

#[tokio::test]
async fn confirm_after_url_left_queue_is_conflict() {
    let (urls, fields) = workshop_pages();
    let app = test_app(urls, fields, queue_of(&["https://events.example/a"]));

    let (status, body) = send(&app.router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["request_id"].as_str().unwrap().to_string();

    app.store.delete_row("Queue", 2).await.unwrap();

    let (status, body) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("no longer in the queue"));
    assert!(app.store.rows("Events").is_empty());
}

#[tokio::test]
async fn failed_queue_delete_still_confirms_with_warning() {
    let (urls, fields) = workshop_pages();
    let store = Arc::new(queue_of(&["https://events.example/a"]));
    let router = test_router(test_deps(urls, fields, Arc::new(FailingDeletes(store.clone()))));

    let (status, body) = send(&router, post("/queue/next")).await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["request_id"].as_str().unwrap().to_string();

    let (status, body) = send(&router, post(&format!("/confirm/{}", request_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["warning"].as_str().unwrap().contains("queue row"));

    assert_eq!(store.rows("Events").len(), 1);
    assert_eq!(store.rows("Queue").len(), 2, "The queue row is still there");

    // The record was saved, so it cannot be confirmed twice.
    let (status, _) = send(&router, post(&format!("/confirm/{}", request_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn confirm_without_queue_omits_warning() {
    let fields = MockFieldExtractor::new().with_response("Gala", json!({"שם_האירוע": "Gala"}));
    let app = test_app(MockUrlSource::new(), fields, MemoryRowStore::new());

    let (_, body) = post_json(&app.router, "/run", json!({"text_input": "Gala night"})).await;
    let request_id = body["request_id"].as_str().unwrap().to_string();
    let (status, body) = send(&app.router, post(&format!("/confirm/{}", request_id))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn large_pdf_payload_is_accepted() {
    let app = test_app(MockUrlSource::new(), MockFieldExtractor::new(), MemoryRowStore::new());
    let pdf_data = STANDARD.encode(vec![b'%'; 3 * 1024 * 1024]);

    let (status, body) = post_json(&app.router, "/run", json!({"pdf_data": pdf_data})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trace"][0]["source_type"], "pdf");
    assert_eq!(body["trace"][0]["source_content"], "No text found in PDF");
}

#[tokio::test]
async fn body_over_configured_limit_is_rejected() {
    let deps = test_deps(
        MockUrlSource::new(),
        MockFieldExtractor::new(),
        Arc::new(MemoryRowStore::new()),
    );
    let router = build_app(deps, &[], 1024);

    let (status, _) = post_json(&router, "/run", json!({"text_input": "x".repeat(4096)})).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
