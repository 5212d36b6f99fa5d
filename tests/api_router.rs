use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use action_primitives::scripted::ScriptedSessionFactory;
use action_primitives::SessionFactory;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use disposition_flow::{Actors, BpmLookup, DispositionExecutor, RetryController, RetryPolicy};
use firco_disposition::output::{OutputLayout, DAILY_LOG, ERROR_LOG};
use firco_disposition::server::{build_router, ServeState};
use firco_disposition::DispositionService;
use serde_json::{json, Value};
use tower::ServiceExt;
use transaction_locator::fixtures::{self, posted_success, FircoUi};

fn service(ui: &FircoUi, factory: &ScriptedSessionFactory, root: &Path) -> DispositionService {
    let policy = RetryPolicy {
        backoff: Duration::ZERO,
        ..RetryPolicy::default()
    };
    let factory: Arc<dyn SessionFactory> = Arc::new(factory.clone());
    let controller = RetryController::new(
        factory.clone(),
        DispositionExecutor::new(ui.locator()),
        Actors::new(fixtures::operator()),
        policy.clone(),
    );
    let lookup = BpmLookup::new(factory, ui.bpm_surface(), policy);
    DispositionService::from_parts(
        controller,
        Some(lookup),
        OutputLayout::new(root.join("output")),
        root.join("screenshots"),
    )
}

fn router(ui: &FircoUi, factory: &ScriptedSessionFactory, root: &Path) -> Router {
    build_router(ServeState::new(service(ui, factory, root)))
}

async fn post(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// The single dated transaction folder under the output root
fn transaction_folder(root: &Path, id: &str) -> PathBuf {
    let dates: Vec<PathBuf> = std::fs::read_dir(root.join("output"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_dir())
        .collect();
    assert_eq!(dates.len(), 1, "expected one dated folder, got {:?}", dates);
    dates[0].join(id)
}

#[tokio::test]
async fn test_release_answers_ok_with_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new().live(vec![posted_success()]).hits(1);
    let factory = ScriptedSessionFactory::new(ui.script().persist_screenshots(true));
    let router = router(&ui, &factory, dir.path());

    let body = json!({
        "transaction": "TXN123",
        "action": "STP-Release",
        "comment": "cleared by compliance"
    });
    let (status, value) = post(&router, "/api", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["status"], "ok");
    assert_eq!(value["status_detail"], "action_performed_on_live");
    assert!(value["transactionId"].as_str().unwrap().starts_with("TXN-"));
    assert!(value.get("errorCode").is_none());

    let folder = transaction_folder(dir.path(), "TXN123");
    assert!(folder.join("one_transaction.png").exists());
    assert!(folder.join("stp_release_1.png").exists());

    let daily = std::fs::read_to_string(dir.path().join("output").join(DAILY_LOG)).unwrap();
    assert!(daily.contains("Transaction TXN123 processing attempt. Final status: action_performed_on_live"));
    assert!(!daily.contains("cleared by compliance"));
    assert!(!dir.path().join("output").join(ERROR_LOG).exists());
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_any_session() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let router = router(&ui, &factory, dir.path());

    let body = json!({ "transaction": "TXN123", "action": "Approve" });
    let (status, value) = post(&router, "/api", body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
    assert_eq!(value["status"], "error");
    assert_eq!(value["errorCode"], "VALIDATION_ERROR");
    assert_eq!(factory.counters().opened(), 0);

    let errors = std::fs::read_to_string(dir.path().join("output").join(ERROR_LOG)).unwrap();
    assert!(errors.contains("ERROR VALIDATION_ERROR: TXN123, action: Approve"));
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let router = router(&ui, &factory, dir.path());

    let (status, value) = post(&router, "/api", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["errorCode"], "VALIDATION_ERROR");
    assert_eq!(factory.counters().opened(), 0);
}

#[tokio::test]
async fn test_not_found_is_reported_with_its_code() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let router = router(&ui, &factory, dir.path());

    let body = json!({ "transaction": "TXN404", "action": "Release" });
    let (status, value) = post(&router, "/api", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], false);
    assert_eq!(value["status_detail"], "transaction_not_found_in_any_tab");
    assert_eq!(value["errorCode"], "TRANSACTION_NOT_FOUND");
    assert!(transaction_folder(dir.path(), "TXN404").is_dir());
}

#[tokio::test]
async fn test_bpm_lookup_without_market_skips_the_browser() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let router = router(&ui, &factory, dir.path());

    let body = json!({ "transactionId": "TXN123", "marketType": "" });
    let (status, value) = post(&router, "/api/bpm", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "ok");
    assert_eq!(
        value["results"]["bmpResult"]["status"],
        "transaction_type_not_defined"
    );
    assert_eq!(factory.counters().opened(), 0);
}

#[tokio::test]
async fn test_health_reports_liveness() {
    let dir = tempfile::tempdir().unwrap();
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let router = router(&ui, &factory, dir.path());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["live"], true);
    assert_eq!(value["in_flight"], 0);
}
