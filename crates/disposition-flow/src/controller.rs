//! Retry and recovery controller
//!
//! Owns one browser session per request and drives
//! `Idle -> Attempting -> {Success, RetryPending, Exhausted}`. Every error
//! is converted into a terminal outcome here; the session is closed exactly
//! once on every path that opened it.

use std::sync::Arc;

use action_primitives::{BrowserSession, NavError, PageNavigator, SessionFactory, SessionScope};
use firco_core_types::{
    Actor, DispositionOutcome, ErrorKind, LocationResult, RawTransactionRequest,
    TransactionRequest,
};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::errors::{lookup, FlowError};
use crate::executor::DispositionExecutor;
use crate::metrics;
use crate::strategies::{FailureClass, RetryPolicy};
use crate::types::{Actors, RetryState, RunReport};

/// Runs requests end to end with bounded retries
#[derive(Clone)]
pub struct RetryController {
    factory: Arc<dyn SessionFactory>,
    executor: DispositionExecutor,
    actors: Actors,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        executor: DispositionExecutor,
        actors: Actors,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            factory,
            executor,
            actors,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Validate a raw request, then run it. Invalid requests never open a session.
    pub async fn run_raw(&self, raw: &RawTransactionRequest, scope: SessionScope) -> RunReport {
        match TransactionRequest::validate(raw) {
            Ok(request) => self.run(&request, scope).await,
            Err(err) => {
                warn!(request = %scope.request_id, %err, "request rejected");
                finish(
                    DispositionOutcome::failed(ErrorKind::Validation, err.to_string()),
                    RetryState::new(),
                )
            }
        }
    }

    /// Run a validated request to its terminal outcome
    pub async fn run(&self, request: &TransactionRequest, scope: SessionScope) -> RunReport {
        info!(
            request = %scope.request_id,
            transaction = %request.id(),
            action = %request.action(),
            market = ?request.market().map(|m| m.label()),
            perform_on_latest = request.perform_on_latest(),
            force_retry = request.force_retry(),
            "processing transaction"
        );
        debug!(transaction = %request.id(), comment = request.comment().as_str(), "request comment");

        let mut state = RetryState::new();
        let mut session = match self.factory.open(&scope).await {
            Ok(session) => session,
            Err(err) => {
                let err = FlowError::Session(err);
                let kind = self.exhausted_kind(&err, &state);
                state.record_failure(err.to_string(), FailureClass::Fatal(kind));
                state.exhaust();
                return finish(DispositionOutcome::failed(kind, err.to_string()), state);
            }
        };

        let attempts = timeout(
            self.policy.deadline,
            self.attempts(session.as_mut(), request, &mut state),
        )
        .await;
        let outcome = match attempts {
            Ok(outcome) => outcome,
            Err(_) => {
                let message = format!(
                    "Transaction {} exceeded the {}s request deadline",
                    request.id(),
                    self.policy.deadline.as_secs()
                );
                warn!(transaction = %request.id(), attempts = state.attempts(), "request deadline expired");
                state.record_failure(message.clone(), FailureClass::Fatal(ErrorKind::Deadline));
                state.exhaust();
                DispositionOutcome::failed(ErrorKind::Deadline, message)
            }
        };

        if let Err(err) = session.close().await {
            warn!(transaction = %request.id(), %err, "session close failed");
        }
        finish(outcome, state)
    }

    async fn attempts(
        &self,
        session: &mut dyn BrowserSession,
        request: &TransactionRequest,
        state: &mut RetryState,
    ) -> DispositionOutcome {
        let mut escalated = false;
        loop {
            let attempt = state.begin_attempt();
            debug!(transaction = %request.id(), attempt, max = self.policy.max_attempts, escalated, "attempt started");

            let err = match self.attempt(session.navigator(), request, &mut escalated).await {
                Ok(outcome) => {
                    state.succeed();
                    self.logout(session.navigator()).await;
                    return outcome;
                }
                Err(err) => err,
            };

            let class = self.policy.classify(&err);
            state.record_failure(err.to_string(), class);

            match class {
                FailureClass::Transient { .. } if self.policy.should_retry(attempt) => {
                    state.retry_pending();
                    metrics::record_retry(class.label());
                    let backoff = self.policy.calculate_backoff(attempt);
                    warn!(
                        transaction = %request.id(),
                        attempt,
                        max = self.policy.max_attempts,
                        classification = class.label(),
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient failure, resetting session"
                    );
                    if let Err(reset_err) = session.reset().await {
                        let err = FlowError::Session(reset_err);
                        state.exhaust();
                        return DispositionOutcome::failed(
                            self.exhausted_kind(&err, state),
                            err.to_string(),
                        );
                    }
                    sleep(backoff).await;
                }
                FailureClass::Transient { .. } => {
                    state.exhaust();
                    let kind = self.exhausted_kind(&err, state);
                    warn!(transaction = %request.id(), attempts = attempt, code = kind.code(), "retries exhausted");
                    return DispositionOutcome::failed(
                        kind,
                        format!("Retries exhausted after {} attempts: {}", attempt, err),
                    );
                }
                FailureClass::Fatal(kind) => {
                    state.exhaust();
                    warn!(transaction = %request.id(), attempt, code = kind.code(), error = %err, "fatal failure");
                    return DispositionOutcome::failed(kind, err.to_string());
                }
            }
        }
    }

    fn exhausted_kind(&self, err: &FlowError, state: &RetryState) -> ErrorKind {
        match self.policy.classify(err) {
            FailureClass::Fatal(kind) => kind,
            FailureClass::Transient { .. } if state.reload_loop() => ErrorKind::ReloadLoop,
            FailureClass::Transient { .. } => ErrorKind::Lookup,
        }
    }

    /// One operator pass, followed by the manager pass after an escalation.
    ///
    /// Once the operator has escalated, `escalated` stays set and later
    /// attempts start from a fresh manager sign-in.
    async fn attempt(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
        escalated: &mut bool,
    ) -> Result<DispositionOutcome, FlowError> {
        let locator = self.executor.locator();
        if !*escalated {
            locator
                .firco()
                .login(nav, &self.actors.operator)
                .await
                .map_err(lookup)?;

            let location = locator.locate(nav, request).await?;
            let outcome = self
                .executor
                .execute(nav, location, request, Actor::Operator)
                .await?;

            if self.actors.manager.is_none()
                || !matches!(outcome, DispositionOutcome::Escalated { .. })
            {
                return Ok(outcome);
            }
            *escalated = true;
            locator.firco().logout(nav, self.bpm_marker()).await?;
        }

        let Some(manager) = &self.actors.manager else {
            return Err(FlowError::Disposition(NavError::Internal(
                "escalated without a manager account".into(),
            )));
        };
        info!(transaction = %request.id(), manager = %manager.username, "handing over to the manager");
        locator.firco().login(nav, manager).await?;

        let location = match locator.locate_live(nav, request).await? {
            Some(found) => LocationResult::FoundInLive(found),
            None => locator.locate(nav, request).await?,
        };
        self.executor
            .execute(nav, location, request, Actor::Manager)
            .await
    }

    fn bpm_marker(&self) -> &str {
        self.executor
            .locator()
            .bpm()
            .map(|bpm| bpm.selectors().url_marker.as_str())
            .unwrap_or("mtexrt")
    }

    async fn logout(&self, nav: &mut dyn PageNavigator) {
        if let Err(err) = self
            .executor
            .locator()
            .firco()
            .logout(nav, self.bpm_marker())
            .await
        {
            warn!(%err, "logout failed");
        }
    }
}

fn finish(outcome: DispositionOutcome, retry: RetryState) -> RunReport {
    metrics::record_outcome(outcome.status_detail());
    info!(
        status_detail = outcome.status_detail(),
        attempts = retry.attempts(),
        "transaction finished"
    );
    RunReport { outcome, retry }
}
