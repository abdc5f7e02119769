//! API integration tests
//!
//! Most tests drive the router in-process against an in-memory visitor store
//! and a temporary output directory. The `#[ignore]`d tests at the bottom
//! expect a running server backed by PostgreSQL.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use epass_server::{
    api,
    config::{AppConfig, Disposition},
    models::visitor::{NewVisitor, VisitorRecord},
    repository::VisitorStore,
    services::Services,
    AppError, AppResult, AppState,
};

/// Visitor store keeping records in memory
#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<VisitorRecord>>,
    unavailable: bool,
}

impl MemoryStore {
    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn records(&self) -> Vec<VisitorRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisitorStore for MemoryStore {
    async fn persist(&self, visitor: &NewVisitor) -> AppResult<VisitorRecord> {
        if self.unavailable {
            return Err(AppError::Persistence(sqlx::Error::PoolTimedOut));
        }
        let record = VisitorRecord {
            id: Uuid::new_v4(),
            visitor_name: visitor.visitor_name.clone(),
            no_of_persons: visitor.no_of_persons,
            purpose: visitor.purpose.clone(),
            contact_number: visitor.contact_number.clone(),
            visit_date: visitor.visit_date.clone(),
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn ping(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::Persistence(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    dir: TempDir,
}

impl TestApp {
    fn output_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("pdfs")
    }

    fn pass_count(&self) -> usize {
        std::fs::read_dir(self.output_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn spawn_app_with(store: MemoryStore, configure: impl FnOnce(&mut AppConfig, &Path)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.documents.public_dir = dir.path().to_path_buf();
    config.documents.output_dir = dir.path().join("pdfs");
    config.documents.logo_path = dir.path().join("logo.png");
    config.documents.map_path = dir.path().join("map.png");
    configure(&mut config, dir.path());

    let store = Arc::new(store);
    let services = Services::new(store.clone(), &config.documents).unwrap();
    let router = api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    });

    TestApp { router, store, dir }
}

fn spawn_app() -> TestApp {
    spawn_app_with(MemoryStore::default(), |_, _| {})
}

fn asha() -> Value {
    json!({
        "visitorName": "Asha Rao",
        "noOfPersons": 2,
        "purpose": "Meeting",
        "contactNumber": "9876543210",
        "visitDate": "2024-05-01"
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn submit(router: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::post("/submit")
        .header(header::HOST, "epass.test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let request = Request::get(uri)
        .header(header::HOST, "epass.test")
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

/// Path part of an absolute URL
fn url_path(url: &str) -> &str {
    let (_, rest) = url.split_once("://").unwrap();
    &rest[rest.find('/').unwrap()..]
}

#[tokio::test]
async fn test_root_liveness() {
    let app = spawn_app();

    let (status, _, body) = get(&app.router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Visitor backend API is running");
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app();

    let (status, _, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let ready = spawn_app();
    let (status, _, _) = get(&ready.router, "/ready").await;
    assert_eq!(status, StatusCode::OK);

    let down = spawn_app_with(MemoryStore::unavailable(), |_, _| {});
    let (status, _, body) = get(&down.router, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_submit_generates_pass() {
    let app = spawn_app();

    let (status, body) = submit(&app.router, asha()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "E-Pass generated successfully!");
    let url = body["pdfURL"].as_str().unwrap();
    assert!(url.starts_with("http://epass.test/pdf/"), "{url}");
    assert!(url.ends_with("-epass.pdf"), "{url}");
    assert_eq!(body["downloadLink"], body["pdfURL"]);

    let records = app.store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].visitor_name, "Asha Rao");
    assert_eq!(records[0].no_of_persons, 2);
    assert_eq!(url_path(url), format!("/pdf/{}-epass.pdf", records[0].id));
    assert_eq!(app.pass_count(), 1);
}

#[tokio::test]
async fn test_submit_behind_https_proxy() {
    let app = spawn_app();
    let request = Request::post("/submit")
        .header(header::HOST, "visitors.example.org")
        .header("x-forwarded-proto", "https")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(asha().to_string()))
        .unwrap();

    let (status, _, bytes) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["pdfURL"]
        .as_str()
        .unwrap()
        .starts_with("https://visitors.example.org/pdf/"));
}

#[tokio::test]
async fn test_download_returned_url() {
    let app = spawn_app();
    let (_, body) = submit(&app.router, asha()).await;
    let url = body["pdfURL"].as_str().unwrap();

    let (status, headers, bytes) = get(&app.router, url_path(url)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    let filename = url.rsplit('/').next().unwrap();
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("inline; filename=\"{}\"", filename).as_str()
    );
    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_download_as_attachment() {
    let app = spawn_app_with(MemoryStore::default(), |config, _| {
        config.documents.disposition = Disposition::Attachment;
    });
    let (_, body) = submit(&app.router, asha()).await;
    let url = body["pdfURL"].as_str().unwrap();

    let (status, headers, _) = get(&app.router, url_path(url)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment;"));
}

#[tokio::test]
async fn test_identical_submissions_get_distinct_passes() {
    let app = spawn_app();

    let (_, first) = submit(&app.router, asha()).await;
    let (_, second) = submit(&app.router, asha()).await;

    assert_ne!(first["pdfURL"], second["pdfURL"]);
    let records = app.store.records();
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].id, records[1].id);
    assert_eq!(app.pass_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_submissions() {
    let app = spawn_app();
    assert!(!app.output_dir().exists());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let router = app.router.clone();
        tasks.spawn(async move { submit(&router, asha()).await });
    }

    let mut urls = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        let (status, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK, "{body}");
        urls.insert(body["pdfURL"].as_str().unwrap().to_string());
    }

    assert_eq!(urls.len(), 8);
    assert_eq!(app.store.records().len(), 8);
    assert_eq!(app.pass_count(), 8);
}

#[tokio::test]
async fn test_numeric_text_fields_are_accepted() {
    let app = spawn_app();
    let mut body = asha();
    body["visitorName"] = json!(123);
    body["contactNumber"] = json!(9876543210u64);

    let (status, body) = submit(&app.router, body).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let records = app.store.records();
    assert_eq!(records[0].visitor_name, "123");
    assert_eq!(records[0].contact_number, "9876543210");
}

#[tokio::test]
async fn test_missing_pass_is_404() {
    let app = spawn_app();

    let (status, headers, body) = get(&app.router, &format!("/pdf/{}-epass.pdf", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body, b"File not found");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let app = spawn_app();
    std::fs::write(app.dir.path().join("secret.txt"), b"secret").unwrap();

    let (status, _, _) = get(&app.router, "/pdf/..%2Fsecret.txt").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_contact_number() {
    let app = spawn_app();
    let mut body = asha();
    body["contactNumber"] = json!("12345");

    let (status, body) = submit(&app.router, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid contact number. Please enter a 10-digit number."
    );
    assert!(body.get("error").is_none());
    assert!(app.store.records().is_empty());
}

#[tokio::test]
async fn test_invalid_person_count() {
    let app = spawn_app();
    for persons in [json!(0), json!(-1), json!("abc")] {
        let mut body = asha();
        body["noOfPersons"] = persons;

        let (status, body) = submit(&app.router, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid number of persons. Please enter a positive number."
        );
    }
    assert_eq!(app.pass_count(), 0);
}

#[tokio::test]
async fn test_missing_field() {
    let app = spawn_app();
    let mut body = asha();
    body.as_object_mut().unwrap().remove("purpose");

    let (status, body) = submit(&app.router, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn test_malformed_json() {
    let app = spawn_app();
    let request = Request::post("/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"visitorName\": "))
        .unwrap();

    let (status, _, bytes) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_persistence_failure() {
    let app = spawn_app_with(MemoryStore::unavailable(), |_, _| {});

    let (status, body) = submit(&app.router, asha()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server error");
    assert!(body["error"].is_string());
    assert_eq!(app.pass_count(), 0);
}

#[tokio::test]
async fn test_render_failure_keeps_record() {
    let app = spawn_app_with(MemoryStore::default(), |config, root| {
        // a regular file where the output directory should be
        let blocked = root.join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        config.documents.output_dir = blocked.join("pdfs");
    });

    let (status, body) = submit(&app.router, asha()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server error");
    assert_eq!(app.store.records().len(), 1);
}

#[tokio::test]
async fn test_submit_with_logo_and_map() {
    let app = spawn_app_with(MemoryStore::default(), |_, root| {
        image::RgbImage::from_pixel(64, 64, image::Rgb([200, 30, 30]))
            .save(root.join("logo.png"))
            .unwrap();
        image::RgbImage::from_pixel(640, 480, image::Rgb([30, 200, 30]))
            .save(root.join("map.png"))
            .unwrap();
    });

    let (status, body) = submit(&app.router, asha()).await;

    assert_eq!(status, StatusCode::OK);
    let (status, _, bytes) = get(&app.router, url_path(body["pdfURL"].as_str().unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_public_assets_are_served() {
    let app = spawn_app();
    std::fs::write(app.dir.path().join("notice.txt"), b"welcome").unwrap();

    let (status, _, body) = get(&app.router, "/public/notice.txt").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"welcome");
}

#[tokio::test]
async fn test_https_enforcement_redirects_plain_requests() {
    let app = spawn_app_with(MemoryStore::default(), |config, _| {
        config.server.enforce_https = true;
    });

    let (status, headers, _) = get(&app.router, "/health?check=1").await;
    assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(headers[header::LOCATION], "https://epass.test/health?check=1");

    std::fs::write(app.dir.path().join("notice.txt"), b"welcome").unwrap();
    let (status, headers, _) = get(&app.router, "/public/notice.txt").await;
    assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(headers[header::LOCATION], "https://epass.test/public/notice.txt");

    let request = Request::get("/health")
        .header(header::HOST, "epass.test")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = spawn_app_with(MemoryStore::default(), |config, _| {
        config.cors.allowed_origins = vec!["https://frontend.example.org".to_string()];
    });
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/submit")
        .header(header::ORIGIN, "https://frontend.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = send(&app.router, request).await;

    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://frontend.example.org"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

const BASE_URL: &str = "http://localhost:3001";

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_live_submit_and_download() {
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/submit", BASE_URL))
        .json(&asha())
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let url = body["pdfURL"].as_str().expect("No pdfURL in response");

    let response = client.get(url).send().await.expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let bytes = response.bytes().await.expect("Failed to read body");
    assert!(!bytes.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_live_readiness() {
    let response = reqwest::get(format!("{}/ready", BASE_URL))
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}
