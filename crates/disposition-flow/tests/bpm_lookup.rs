use std::sync::Arc;
use std::time::Duration;

use action_primitives::scripted::ScriptedSessionFactory;
use action_primitives::{NavError, SessionScope};
use disposition_flow::{BpmLookup, BpmLookupRequest, RetryPolicy};
use firco_core_types::{BpmRowStatus, Environment};
use transaction_locator::fixtures::{bpm_row, FircoUi};
use transaction_locator::BpmSelectors;

fn lookup(ui: &FircoUi, factory: &ScriptedSessionFactory) -> BpmLookup {
    let policy = RetryPolicy {
        backoff: Duration::ZERO,
        ..RetryPolicy::default()
    };
    BpmLookup::new(Arc::new(factory.clone()), ui.bpm_surface(), policy)
}

fn request(market: Option<&str>) -> BpmLookupRequest {
    BpmLookupRequest {
        transaction_id: "TXN123".into(),
        market_type: market.map(str::to_string),
    }
}

fn scope() -> SessionScope {
    SessionScope::new("bpm-TXN123", std::env::temp_dir())
}

#[tokio::test]
async fn test_empty_market_skips_the_browser() {
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());

    for market in [None, Some(""), Some("  ")] {
        let response = lookup(&ui, &factory).run(&request(market), scope()).await;
        assert!(response.is_ok());
        assert_eq!(
            response.results.bmp_result.status,
            BpmRowStatus::TransactionTypeNotDefined
        );
    }
    assert_eq!(factory.counters().opened(), 0);
}

#[tokio::test]
async fn test_lookup_reports_the_row_verdict() {
    let ui = FircoUi::new().bpm("TXN123", bpm_row("TXN123", "PostedTxnToFirco", "12-QM", "SUCCESS"));
    let factory = ScriptedSessionFactory::new(ui.script());

    let response = lookup(&ui, &factory).run(&request(Some("SEPA-Instant")), scope()).await;

    assert!(response.is_ok());
    let report = &response.results.bmp_result;
    assert_eq!(report.status, BpmRowStatus::Success);
    assert!(report.success);
    assert_eq!(report.environment, Some(Environment::Uat));
    assert_eq!(report.details.holding_qm, "12-QM");
    assert_eq!(factory.counters().opened(), 1);
    assert_eq!(factory.counters().closed(), 1);

    let value = serde_json::to_value(&response).expect("serializable");
    assert_eq!(value["status"], "ok");
    assert_eq!(value["results"]["bmpResult"]["status"], "success");
    assert_eq!(value["results"]["bmpResult"]["details"]["reference"], "TXN123");
}

#[tokio::test]
async fn test_unknown_market_is_rejected() {
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());

    let response = lookup(&ui, &factory).run(&request(Some("SWIFT-GPI")), scope()).await;

    assert!(!response.is_ok());
    assert_eq!(response.results.bmp_result.status, BpmRowStatus::Invalid);
    assert_eq!(factory.counters().opened(), 0);
}

#[tokio::test]
async fn test_reload_during_search_is_retried() {
    let b = BpmSelectors::default();
    let ui = FircoUi::new().bpm("TXN123", bpm_row("TXN123", "UNDEFINED", "12", ""));
    let script = ui
        .script()
        .fail(&b.search_tab, NavError::Timeout("frame was detached".into()), 1);
    let factory = ScriptedSessionFactory::new(script);

    let response = lookup(&ui, &factory).run(&request(Some("FEDWIRE")), scope()).await;

    assert!(response.is_ok());
    assert_eq!(response.results.bmp_result.status, BpmRowStatus::Error);
    assert_eq!(factory.counters().resets(), 1);
    assert_eq!(factory.counters().closed(), 1);
}

#[tokio::test]
async fn test_rejected_login_is_an_error_response() {
    let ui = FircoUi::new().reject_logins();
    let factory = ScriptedSessionFactory::new(ui.script());

    let response = lookup(&ui, &factory).run(&request(Some("CHAPS-MX")), scope()).await;

    assert!(!response.is_ok());
    assert_eq!(response.results.bmp_result.status, BpmRowStatus::Unknown);
    assert!(response.results.bmp_result.message.contains("rejected"));
    assert_eq!(factory.counters().resets(), 0);
    assert_eq!(factory.counters().closed(), 1);
}
