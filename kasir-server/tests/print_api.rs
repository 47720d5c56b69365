//! Router-level tests for the printing API
//!
//! Drives the real router with a scripted driver instead of hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kasir_printer::{
    Capabilities, PrintCommand, PrintError, PrintResult, PrinterConnection, PrinterDriver,
};
use kasir_server::{
    Config, PosStorage, PrintService, ReceiptRenderer, ServerState, TransactionSnapshot,
    build_router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Driver that records open attempts and optionally fails them
#[derive(Default)]
struct ScriptedDriver {
    opens: AtomicU32,
    fail_open_on: Option<u32>,
    online: bool,
}

impl ScriptedDriver {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            online: true,
            ..Default::default()
        })
    }
}

#[async_trait]
impl PrinterDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_open_on == Some(attempt) {
            return Err(PrintError::DeviceUnavailable("simulated unplug".into()));
        }
        Ok(Box::new(NullConnection))
    }

    async fn is_online(&self) -> bool {
        self.online
    }
}

struct NullConnection;

#[async_trait]
impl PrinterConnection for NullConnection {
    async fn write(&mut self, _command: &PrintCommand) -> PrintResult<()> {
        Ok(())
    }

    async fn cut(&mut self) -> PrintResult<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> PrintResult<()> {
        Ok(())
    }
}

fn ready(driver: Arc<ScriptedDriver>) -> Result<Arc<dyn PrinterDriver>, String> {
    Ok(driver)
}

fn seeded_storage() -> PosStorage {
    let storage = PosStorage::open_in_memory().unwrap();
    storage
        .put_transaction(&TransactionSnapshot {
            id: 1,
            total: 45000,
            paid: 50000,
            change: 5000,
            created_at: 1705912335000,
            items: vec![],
        })
        .unwrap();
    storage
}

fn test_state(
    driver: Result<Arc<dyn PrinterDriver>, String>,
    storage: PosStorage,
) -> ServerState {
    let mut config = Config::from_env();
    config.copy_delay = Duration::from_millis(1);
    let shutdown = CancellationToken::new();
    let store = Arc::new(storage.clone());
    let print_service = Arc::new(PrintService::new(
        driver,
        store.clone(),
        store,
        ReceiptRenderer::new(32, chrono_tz::Asia::Jakarta),
        config.copy_delay,
        shutdown.child_token(),
    ));
    ServerState {
        config: Arc::new(config),
        storage,
        print_service,
        shutdown,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_print_transaction_ok() {
    let driver = ScriptedDriver::ok();
    let app = build_router(test_state(ready(driver.clone()), seeded_storage()));

    let response = app.oneshot(post("/api/transactions/1/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["copies"], 1);
    assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_print_transaction_multiple_copies() {
    let driver = ScriptedDriver::ok();
    let app = build_router(test_state(ready(driver.clone()), seeded_storage()));

    let response = app
        .oneshot(post("/api/transactions/1/print?copies=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["copies"], 3);
    assert_eq!(driver.opens.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_copies_default_comes_from_settings() {
    let driver = ScriptedDriver::ok();
    let storage = seeded_storage();
    storage.put_setting("printCopies", "2").unwrap();
    let app = build_router(test_state(ready(driver.clone()), storage));

    let response = app.oneshot(post("/api/transactions/1/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["copies"], 2);
    assert_eq!(driver.opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unknown_transaction_is_404() {
    let app = build_router(test_state(ready(ScriptedDriver::ok()), seeded_storage()));

    let response = app
        .oneshot(post("/api/transactions/999/print"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_missing_driver_is_501() {
    let app = build_router(test_state(
        Err("libusb init failed".into()),
        seeded_storage(),
    ));

    let response = app.oneshot(post("/api/transactions/1/print")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

    let body = body_json(response).await;
    assert_eq!(body["details"], "libusb init failed");
}

#[tokio::test]
async fn test_device_failure_is_502_with_copy_detail() {
    let driver = Arc::new(ScriptedDriver {
        fail_open_on: Some(2),
        online: true,
        ..Default::default()
    });
    let app = build_router(test_state(ready(driver), seeded_storage()));

    let response = app
        .oneshot(post("/api/transactions/1/print?copies=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("copy 2/3"), "unexpected error: {error}");
    assert!(error.contains("1 printed"), "unexpected error: {error}");
}

#[tokio::test]
async fn test_printer_status_available() {
    let app = build_router(test_state(ready(ScriptedDriver::ok()), seeded_storage()));

    let response = app.oneshot(get("/api/printer/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_printer_status_reports_missing_driver() {
    let app = build_router(test_state(
        Err("libusb init failed".into()),
        seeded_storage(),
    ));

    let response = app.oneshot(get("/api/printer/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["available"], false);
    assert_eq!(body["message"], "libusb init failed");
}

#[tokio::test]
async fn test_print_test_page() {
    let driver = ScriptedDriver::ok();
    let app = build_router(test_state(ready(driver.clone()), seeded_storage()));

    let response = app.oneshot(post("/api/printer/test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(driver.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health() {
    let app = build_router(test_state(ready(ScriptedDriver::ok()), seeded_storage()));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
