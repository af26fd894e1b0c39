//! Startup checks run before the daemon binds its listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pgdb_core::ProvisionPolicy;
use pgdb_runtime::{FakeCall, FakeRuntime};
use pgdbd::{ServeConfig, prepare};
use tower::ServiceExt;

fn config(dir: &tempfile::TempDir, token: &str) -> ServeConfig {
    ServeConfig {
        data_dir: dir.path().join("data"),
        public_host: None,
        token: token.to_string(),
        policy: ProvisionPolicy::default(),
    }
}

#[test]
fn unavailable_runtime_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(FakeRuntime::new().unavailable());

    let err = prepare(&config(&dir, "secret"), runtime.clone()).unwrap_err();

    assert!(format!("{err:#}").contains("container runtime is not available"));
    assert_eq!(runtime.calls(), vec![FakeCall::EnsureAvailable]);
}

#[test]
fn blank_token_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(FakeRuntime::new());

    assert!(prepare(&config(&dir, "  "), runtime.clone()).is_err());
    assert!(runtime.calls().is_empty());
    assert!(!dir.path().join("data").exists());
}

#[test]
fn unusable_data_dir_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data"), b"not a directory").unwrap();
    let runtime = Arc::new(FakeRuntime::new());

    assert!(prepare(&config(&dir, "secret"), runtime.clone()).is_err());
    assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn healthy_startup_creates_data_dir_and_serves() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(FakeRuntime::new());

    let router = prepare(&config(&dir, "secret"), runtime.clone()).unwrap();

    assert!(dir.path().join("data").is_dir());
    assert_eq!(runtime.calls(), vec![FakeCall::EnsureAvailable]);

    let req = Request::builder()
        .uri("/v1/status")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
