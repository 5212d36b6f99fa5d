use std::sync::Arc;
use std::time::Duration;

use action_primitives::scripted::{ScriptedNavigator, ScriptedSessionFactory};
use action_primitives::{NavError, SessionFactory, SessionScope};
use disposition_flow::{
    Actors, DispositionExecutor, RetryController, RetryPhase, RetryPolicy, RunReport,
};
use firco_core_types::{
    Actor, DispositionAction, DispositionOutcome, ErrorKind, MarketType, NoOpReason,
    RawMarkers, RawTransactionRequest, TransactionRequest,
};
use transaction_locator::fixtures::{self, posted_success, FircoUi};
use transaction_locator::FircoSelectors;

fn policy() -> RetryPolicy {
    RetryPolicy {
        backoff: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

fn controller(ui: &FircoUi, factory: &ScriptedSessionFactory, with_manager: bool) -> RetryController {
    let mut actors = Actors::new(fixtures::operator());
    if with_manager {
        actors = actors.with_manager(fixtures::manager());
    }
    let factory: Arc<dyn SessionFactory> = Arc::new(factory.clone());
    RetryController::new(factory, DispositionExecutor::new(ui.locator()), actors, policy())
}

fn request(action: DispositionAction) -> TransactionRequest {
    TransactionRequest::new("TXN123", action)
        .expect("valid request")
        .with_comment("cleared by compliance")
        .expect("valid comment")
}

fn scope() -> SessionScope {
    SessionScope::new("TXN123", std::env::temp_dir())
}

async fn run(ui: &FircoUi, factory: &ScriptedSessionFactory, request: &TransactionRequest) -> RunReport {
    controller(ui, factory, false).run(request, scope()).await
}

fn assert_one_session(factory: &ScriptedSessionFactory) {
    assert_eq!(factory.counters().opened(), 1);
    assert_eq!(factory.counters().closed(), 1);
}

fn mutating_clicks(factory: &ScriptedSessionFactory) -> Vec<String> {
    let s = FircoSelectors::default();
    let mutating: Vec<&str> = DispositionAction::ALL
        .iter()
        .map(|action| s.action_button(*action))
        .chain([s.escalate_button.as_str(), s.confirm_button.as_str()])
        .collect();
    factory
        .script()
        .clicks()
        .into_iter()
        .filter(|click| mutating.contains(&click.as_str()))
        .collect()
}

#[tokio::test]
async fn test_stp_release_on_single_live_match() {
    let ui = FircoUi::new().live(vec![posted_success()]).hits(2);
    let factory = ScriptedSessionFactory::new(ui.script());

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(
        report.outcome,
        DispositionOutcome::ActionPerformedOnLive {
            action: DispositionAction::StpRelease
        }
    );
    assert_eq!(report.retry.attempts(), 1);
    assert_eq!(report.retry.phase(), RetryPhase::Success);
    assert_one_session(&factory);

    let s = FircoSelectors::default();
    let script = factory.script();
    assert!(script
        .fills()
        .contains(&(s.comment_field.clone(), "cleared by compliance".to_string())));
    let shots = script.screenshots();
    for name in ["one_transaction", "hit_0", "hit_1", "hit_2", "stp_release_1", "stp_release_3"] {
        assert!(shots.iter().any(|shot| shot == name), "missing {}", name);
    }
    assert_eq!(script.clicks().last(), Some(&s.logout_button));
}

#[tokio::test]
async fn test_block_is_escalated_without_a_manager() {
    let ui = FircoUi::new().live(vec![posted_success()]);
    let factory = ScriptedSessionFactory::new(ui.script());

    let report = run(&ui, &factory, &request(DispositionAction::Block)).await;

    assert_eq!(
        report.outcome,
        DispositionOutcome::Escalated {
            action: DispositionAction::Block
        }
    );
    let s = FircoSelectors::default();
    assert_eq!(mutating_clicks(&factory), vec![s.escalate_button.clone()]);
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_manager_applies_escalated_action() {
    let ui = FircoUi::new().live(vec![posted_success()]);
    let factory = ScriptedSessionFactory::new(ui.script());

    let report = controller(&ui, &factory, true)
        .run(&request(DispositionAction::Block), scope())
        .await;

    assert_eq!(
        report.outcome,
        DispositionOutcome::ActionPerformedOnLive {
            action: DispositionAction::Block
        }
    );
    let s = FircoSelectors::default();
    assert_eq!(
        mutating_clicks(&factory),
        vec![
            s.escalate_button.clone(),
            s.block_button.clone(),
            s.confirm_button.clone()
        ]
    );
    let usernames: Vec<String> = factory
        .script()
        .fills()
        .into_iter()
        .filter(|(selector, _)| *selector == s.username_input)
        .map(|(_, value)| value)
        .collect();
    assert_eq!(usernames, vec!["506".to_string(), "507".to_string()]);
    assert_eq!(report.retry.attempts(), 1);
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_manager_retry_does_not_escalate_again() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui.script().fail(
        &s.block_button,
        NavError::Timeout("frame was detached while clicking".into()),
        1,
    );
    let factory = ScriptedSessionFactory::new(script);

    let report = controller(&ui, &factory, true)
        .run(&request(DispositionAction::Block), scope())
        .await;

    assert_eq!(
        report.outcome,
        DispositionOutcome::ActionPerformedOnLive {
            action: DispositionAction::Block
        }
    );
    assert_eq!(report.retry.attempts(), 2);
    assert_eq!(factory.counters().resets(), 1);
    assert_eq!(
        mutating_clicks(&factory),
        vec![
            s.escalate_button.clone(),
            s.block_button.clone(),
            s.confirm_button.clone()
        ]
    );
    let usernames: Vec<String> = factory
        .script()
        .fills()
        .into_iter()
        .filter(|(selector, _)| *selector == s.username_input)
        .map(|(_, value)| value)
        .collect();
    assert_eq!(
        usernames,
        vec!["506".to_string(), "507".to_string(), "507".to_string()]
    );
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_manager_execute_on_same_location() {
    let ui = FircoUi::new().live(vec![posted_success()]);
    let mut nav = ScriptedNavigator::new(ui.script());
    let executor = DispositionExecutor::new(ui.locator());
    let request = request(DispositionAction::Block);

    let location = executor.locator().locate(&mut nav, &request).await.expect("located");
    let operator = executor
        .execute(&mut nav, location.clone(), &request, Actor::Operator)
        .await
        .expect("executed");
    assert_eq!(operator.status_detail(), "escalated");

    let manager = executor
        .execute(&mut nav, location, &request, Actor::Manager)
        .await
        .expect("executed");
    assert_eq!(manager.status_detail(), "action_performed_on_live");
}

#[tokio::test]
async fn test_history_match_is_already_handled_twice() {
    let ui = FircoUi::new().history(1);
    let factory = ScriptedSessionFactory::new(ui.script());
    let request = request(DispositionAction::Release);

    for _ in 0..2 {
        let report = run(&ui, &factory, &request).await;
        assert_eq!(
            report.outcome,
            DispositionOutcome::AlreadyHandled {
                reason: NoOpReason::RecordedInHistory
            }
        );
    }
    assert!(mutating_clicks(&factory).is_empty());
    assert_eq!(factory.counters().opened(), 2);
    assert_eq!(factory.counters().closed(), 2);
}

#[tokio::test]
async fn test_forced_retry_searches_live_again() {
    let ui = FircoUi::new().history(1);
    let factory = ScriptedSessionFactory::new(ui.script());
    let request = request(DispositionAction::StpRelease).with_force_retry(true);

    let report = run(&ui, &factory, &request).await;

    assert_eq!(report.outcome.status_detail(), "already_handled");
    let s = FircoSelectors::default();
    let live_visits = factory
        .script()
        .clicks()
        .iter()
        .filter(|click| **click == s.live_messages_link)
        .count();
    // first lookup plus the forced live search
    assert_eq!(live_visits, 2);
    assert!(mutating_clicks(&factory).is_empty());
}

#[tokio::test]
async fn test_not_found_anywhere() {
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let request = request(DispositionAction::StpRelease).with_market(MarketType::Fedwire);

    let report = run(&ui, &factory, &request).await;

    assert_eq!(report.outcome, DispositionOutcome::NotFoundInAnyTab);
    assert!(report.outcome.error_kind().is_none());
    // Session ended on the BPM application, nothing to sign out of
    let s = FircoSelectors::default();
    assert!(!factory.script().clicks().contains(&s.logout_button));
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_ambiguous_match_is_not_retried() {
    let ui = FircoUi::new().live(vec![posted_success(), posted_success(), posted_success()]);
    let factory = ScriptedSessionFactory::new(ui.script());

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::AmbiguousMatch));
    assert_eq!(report.retry.attempts(), 1);
    assert_eq!(report.retry.phase(), RetryPhase::Exhausted);
    assert_eq!(factory.counters().resets(), 0);
    assert!(mutating_clicks(&factory).is_empty());
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_latest_of_several_is_acted_on() {
    let stale = RawMarkers::new("12-QM", "SendResponseToRTPS", "SUCCESS");
    let ui = FircoUi::new()
        .live(vec![stale.clone(), posted_success()])
        .live_sorted(vec![posted_success(), stale]);
    let factory = ScriptedSessionFactory::new(ui.script());
    let request = request(DispositionAction::StpRelease).with_perform_on_latest(true);

    let report = run(&ui, &factory, &request).await;

    assert_eq!(report.outcome.status_detail(), "action_performed_on_live");
    assert!(factory.script().screenshots().contains(&"more_transactions".to_string()));
}

#[tokio::test]
async fn test_reload_loop_recovers_on_third_attempt() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui.script().fail(
        &s.live_messages_link,
        NavError::Timeout("page reload while waiting for the grid".into()),
        2,
    );
    let factory = ScriptedSessionFactory::new(script);

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.status_detail(), "action_performed_on_live");
    assert_eq!(report.retry.attempts(), 3);
    assert_eq!(factory.counters().resets(), 2);
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_always_transient_failure_is_bounded() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui.script().fail(
        &s.live_messages_link,
        NavError::Timeout("Execution context was destroyed".into()),
        usize::MAX,
    );
    let factory = ScriptedSessionFactory::new(script);

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::ReloadLoop));
    assert!(ErrorKind::ReloadLoop.allows_forced_retry());
    assert_eq!(report.retry.attempts(), policy().max_attempts);
    assert_eq!(report.retry.phase(), RetryPhase::Exhausted);
    assert_eq!(factory.counters().resets(), 2);
    assert_one_session(&factory);
    match report.outcome {
        DispositionOutcome::Failed { message, .. } => {
            assert!(message.starts_with("Retries exhausted after 3 attempts"))
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_lookup_timeout_exhausts_as_lookup_error() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui.script().fail(
        &s.data_filter_input,
        NavError::Timeout("waiting for the filter input".into()),
        usize::MAX,
    );
    let factory = ScriptedSessionFactory::new(script);

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Lookup));
    assert_eq!(report.retry.attempts(), 3);
    assert!(!report.retry.reload_loop());
}

#[tokio::test]
async fn test_missing_action_button_is_fatal() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui
        .script()
        .fail(&s.stp_release_button, NavError::NotFound("stp release button".into()), 1);
    let factory = ScriptedSessionFactory::new(script);

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Automation));
    assert_eq!(report.retry.attempts(), 1);
    assert_eq!(factory.counters().resets(), 0);
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_rejected_credentials_are_a_permission_error() {
    let ui = FircoUi::new().live(vec![posted_success()]).reject_logins();
    let factory = ScriptedSessionFactory::new(ui.script());

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Permission));
    assert_eq!(report.retry.attempts(), 1);
    assert_one_session(&factory);
}

#[tokio::test]
async fn test_failing_open_is_a_connection_error() {
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script())
        .failing_open(NavError::Connection("chromium not reachable".into()));

    let report = run(&ui, &factory, &request(DispositionAction::StpRelease)).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Connection));
    assert_eq!(report.retry.attempts(), 0);
    assert_eq!(factory.counters().opened(), 0);
    assert_eq!(factory.counters().closed(), 0);
}

#[tokio::test]
async fn test_invalid_request_never_opens_a_session() {
    let ui = FircoUi::new();
    let factory = ScriptedSessionFactory::new(ui.script());
    let raw = RawTransactionRequest {
        transaction: "TXN123".into(),
        action: "Approve".into(),
        ..RawTransactionRequest::default()
    };

    let report = controller(&ui, &factory, false).run_raw(&raw, scope()).await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Validation));
    assert_eq!(factory.counters().opened(), 0);
    assert_eq!(factory.counters().closed(), 0);
}

#[tokio::test]
async fn test_valid_raw_request_runs() {
    let ui = FircoUi::new().sanctions_bypass(1);
    let factory = ScriptedSessionFactory::new(ui.script());
    let raw = RawTransactionRequest {
        transaction: " TXN123 ".into(),
        action: "stp_release".into(),
        ..RawTransactionRequest::default()
    };

    let report = controller(&ui, &factory, false).run_raw(&raw, scope()).await;

    assert_eq!(report.outcome, DispositionOutcome::FoundInSanctionsBypass);
    assert_one_session(&factory);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_tears_the_session_down() {
    let s = FircoSelectors::default();
    let ui = FircoUi::new().live(vec![posted_success()]);
    let script = ui.script().fail(
        &s.live_messages_link,
        NavError::Timeout("reload".into()),
        usize::MAX,
    );
    let factory = ScriptedSessionFactory::new(script);
    let policy = RetryPolicy {
        backoff: Duration::from_secs(30),
        deadline: Duration::from_secs(5),
        ..RetryPolicy::default()
    };
    let controller = RetryController::new(
        Arc::new(factory.clone()),
        DispositionExecutor::new(ui.locator()),
        Actors::new(fixtures::operator()),
        policy,
    );

    let report = controller
        .run(&request(DispositionAction::StpRelease), scope())
        .await;

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::Deadline));
    assert_eq!(report.retry.phase(), RetryPhase::Exhausted);
    assert_one_session(&factory);
}
