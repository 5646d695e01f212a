//! HTTP tests for the LED sales tracker front door.
//!
//! These drive the full router in-process with `tower::ServiceExt::oneshot`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use ledtracker_controller::Controller;
use ledtracker_core::{ConfigError, CredentialStore, Credentials, FrameBuffer, MemoryCredentialStore};
use ledtracker_display::{DisplayError, MatrixBackend, MatrixDisplay};
use ledtracker_network::NetworkConfigurator;
use ledtracker_sales::{MockSalesSource, SalesSource};
use ledtracker_web::{create_router, ServerState};

/// Keeps every pushed frame.
#[derive(Clone, Default)]
struct RecordingBackend {
    frames: Arc<Mutex<Vec<FrameBuffer>>>,
}

impl MatrixBackend for RecordingBackend {
    fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct TestApp {
    router: Router,
    credentials: Arc<MemoryCredentialStore>,
    frames: Arc<Mutex<Vec<FrameBuffer>>>,
}

fn build_app(sales: Arc<dyn SalesSource>, network: Option<NetworkConfigurator>) -> TestApp {
    let backend = RecordingBackend::default();
    let frames = backend.frames.clone();
    let controller = Arc::new(Controller::new(sales, MatrixDisplay::new(Box::new(backend))));
    let credentials = Arc::new(MemoryCredentialStore::new());

    let mut state = ServerState::new(controller, credentials.clone());
    if let Some(network) = network {
        state = state.with_network(network);
    }

    TestApp {
        router: create_router(Arc::new(state)),
        credentials,
        frames,
    }
}

fn default_app() -> TestApp {
    build_app(Arc::new(MockSalesSource::new()), None)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_greeting() {
    let app = default_app();
    let (status, body) = send(&app.router, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello from RPi LED Device!");
}

#[tokio::test]
async fn test_setup_page() {
    let app = default_app();
    let (status, body) = send(&app.router, get("/setup")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Captive Portal Setup Page (placeholder)");
}

#[tokio::test]
async fn test_setup_post_any_body() {
    let app = default_app();

    let requests = vec![
        Request::builder()
            .method(Method::POST)
            .uri("/setup")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method(Method::POST)
            .uri("/setup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"ssid":"x"}"#))
            .unwrap(),
        Request::builder()
            .method(Method::POST)
            .uri("/setup")
            .body(Body::from(vec![0xff, 0x00, 0xfe]))
            .unwrap(),
        post_form("/setup", "garbage=%%%"),
        post_form("/setup", "password=no-ssid-given"),
    ];

    for request in requests {
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Saving new credentials (placeholder)");
    }

    // none of those were usable credentials
    assert!(!app.credentials.is_configured());
}

#[tokio::test]
async fn test_setup_post_saves_credentials() {
    let app = default_app();

    let (status, body) = send(
        &app.router,
        post_form(
            "/setup",
            "ssid=Home+Net&password=correct%20horse&amazon_id=client-1&amazon_secret=s%24cret&refresh=Atzr%7C1",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Saving new credentials (placeholder)");

    let stored = app.credentials.load().unwrap();
    assert_eq!(stored.wifi.ssid, "Home Net");
    assert_eq!(stored.wifi.passphrase, "correct horse");
    assert_eq!(stored.sales.client_id, "client-1");
    assert_eq!(stored.sales.client_secret, "s$cret");
    assert_eq!(stored.sales.refresh_token, "Atzr|1");
}

#[tokio::test]
async fn test_setup_post_keeps_ssid_spaces() {
    let app = default_app();

    let (status, _) = send(&app.router, post_form("/setup", "ssid=%20Cafe%20&password=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.credentials.load().unwrap().wifi.ssid, " Cafe ");

    let blank = default_app();
    send(&blank.router, post_form("/setup", "ssid=%20%20&password=")).await;
    assert!(!blank.credentials.is_configured());
}

#[tokio::test]
async fn test_setup_post_invalid_credentials_not_saved() {
    let app = default_app();

    let (status, body) = send(&app.router, post_form("/setup", "ssid=Home&password=short")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Saving new credentials (placeholder)");
    assert!(!app.credentials.is_configured());
}

#[tokio::test]
async fn test_setup_post_applies_network_config() {
    let path: PathBuf =
        std::env::temp_dir().join(format!("wpa-{}.conf", uuid::Uuid::new_v4()));
    let app = build_app(
        Arc::new(MockSalesSource::new()),
        Some(NetworkConfigurator::new(&path, "wlan0")),
    );

    let (status, _) = send(&app.router, post_form("/setup", "ssid=Cafe&password=")).await;
    assert_eq!(status, StatusCode::OK);

    // applied in the background
    let mut written = None;
    for _ in 0..50 {
        if let Ok(text) = std::fs::read_to_string(&path) {
            written = Some(text);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let written = written.expect("wpa_supplicant config should be written");
    assert!(written.contains("ssid=\"Cafe\""));
    assert!(written.contains("key_mgmt=NONE"));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_update_matrix_success() {
    let app = default_app();

    let (status, body) = send(&app.router, get("/update-matrix")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Matrix updated!");

    let frames = app.frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].lit_count() > 0);
}

#[tokio::test]
async fn test_update_matrix_failure() {
    let app = build_app(Arc::new(MockSalesSource::failing("api unreachable")), None);

    let (status, body) = send(&app.router, get("/update-matrix")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to update matrix");
    assert!(app.frames.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_reports_updates() {
    let app = default_app();

    let (_, body) = send(&app.router, get("/status")).await;
    let status: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["configured"], false);
    assert!(status["ssid"].is_null());
    assert!(status["lastSnapshot"].is_null());
    assert_eq!(status["salesSource"], "mock");

    send(&app.router, get("/update-matrix")).await;
    send(
        &app.router,
        post_form("/setup", "ssid=HomeNet&password=password123&amazon_secret=hidden"),
    )
    .await;

    let (code, body) = send(&app.router, get("/status")).await;
    assert_eq!(code, StatusCode::OK);
    assert!(!body.contains("password123"));
    assert!(!body.contains("hidden"));

    let status: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["configured"], true);
    assert_eq!(status["ssid"], "HomeNet");
    assert_eq!(status["lastSnapshot"]["sales_today"], 123);
    assert_eq!(status["lastSnapshot"]["sales_yesterday"], 98);
    assert_eq!(status["statistics"]["matrixUpdates"], 1);
    assert_eq!(status["statistics"]["failedUpdates"], 0);
}

/// Records the thread each load runs on.
#[derive(Default)]
struct ThreadRecordingStore {
    inner: MemoryCredentialStore,
    load_threads: Mutex<Vec<std::thread::ThreadId>>,
}

impl CredentialStore for ThreadRecordingStore {
    fn load(&self) -> Result<Credentials, ConfigError> {
        self.load_threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        self.inner.load()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        self.inner.save(credentials)
    }
}

#[tokio::test]
async fn test_status_loads_credentials_off_runtime_thread() {
    let backend = RecordingBackend::default();
    let controller = Arc::new(Controller::new(
        Arc::new(MockSalesSource::new()),
        MatrixDisplay::new(Box::new(backend)),
    ));
    let store = Arc::new(ThreadRecordingStore::default());
    let router = create_router(Arc::new(ServerState::new(controller, store.clone())));

    let (status, _) = send(&router, get("/status")).await;
    assert_eq!(status, StatusCode::OK);

    let threads = store.load_threads.lock().unwrap();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], std::thread::current().id());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = default_app();
    let (status, _) = send(&app.router, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
