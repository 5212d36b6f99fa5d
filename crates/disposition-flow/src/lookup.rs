//! Read-only BPM lookup
//!
//! Secondary boundary next to the disposition flow: one session per
//! lookup, transient failures retried like a disposition attempt.

use std::sync::Arc;

use action_primitives::{BrowserSession, SessionFactory, SessionScope};
use firco_core_types::{BpmRowReport, BpmRowStatus, MarketType, TransactionId};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use transaction_locator::BpmSurface;

use crate::errors::{lookup, FlowError};
use crate::metrics;
use crate::strategies::{FailureClass, RetryPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpmLookupRequest {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub market_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmLookupResults {
    #[serde(rename = "bmpResult")]
    pub bmp_result: BpmRowReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmLookupResponse {
    pub status: String,
    pub results: BpmLookupResults,
}

impl BpmLookupResponse {
    fn ok(report: BpmRowReport) -> Self {
        Self {
            status: "ok".to_string(),
            results: BpmLookupResults { bmp_result: report },
        }
    }

    pub fn error(status: BpmRowStatus, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            results: BpmLookupResults {
                bmp_result: BpmRowReport::without_row(status, message),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Runs BPM lookups end to end
#[derive(Clone)]
pub struct BpmLookup {
    factory: Arc<dyn SessionFactory>,
    bpm: BpmSurface,
    policy: RetryPolicy,
}

impl BpmLookup {
    pub fn new(factory: Arc<dyn SessionFactory>, bpm: BpmSurface, policy: RetryPolicy) -> Self {
        Self {
            factory,
            bpm,
            policy,
        }
    }

    pub async fn run(&self, request: &BpmLookupRequest, scope: SessionScope) -> BpmLookupResponse {
        let id = match TransactionId::parse(&request.transaction_id) {
            Ok(id) => id,
            Err(err) => return BpmLookupResponse::error(BpmRowStatus::Invalid, err.to_string()),
        };
        let market = match request.market_type.as_deref().map(str::trim) {
            None | Some("") => {
                info!(transaction = %id, "transaction type not defined, BPM lookup skipped");
                return BpmLookupResponse::ok(BpmRowReport::without_row(
                    BpmRowStatus::TransactionTypeNotDefined,
                    "Transaction type is not defined.",
                ));
            }
            Some(raw) => match MarketType::resolve(raw) {
                Some(market) => market,
                None => {
                    return BpmLookupResponse::error(
                        BpmRowStatus::Invalid,
                        format!("Unknown transaction type: {}", raw),
                    )
                }
            },
        };

        info!(request = %scope.request_id, transaction = %id, market = market.label(), "BPM lookup");
        let mut session = match self.factory.open(&scope).await {
            Ok(session) => session,
            Err(err) => {
                warn!(transaction = %id, %err, "could not open a session for the BPM lookup");
                return BpmLookupResponse::error(BpmRowStatus::Unknown, err.to_string());
            }
        };

        let checked = timeout(
            self.policy.deadline,
            self.attempts(session.as_mut(), &id, market),
        )
        .await;
        let response = match checked {
            Ok(Ok(report)) => BpmLookupResponse::ok(report),
            Ok(Err(err)) => BpmLookupResponse::error(BpmRowStatus::Unknown, err.to_string()),
            Err(_) => BpmLookupResponse::error(
                BpmRowStatus::Unknown,
                format!(
                    "BPM lookup for {} exceeded the {}s request deadline",
                    id,
                    self.policy.deadline.as_secs()
                ),
            ),
        };

        if let Err(err) = session.close().await {
            warn!(transaction = %id, %err, "session close failed");
        }
        response
    }

    async fn attempts(
        &self,
        session: &mut dyn BrowserSession,
        id: &TransactionId,
        market: MarketType,
    ) -> Result<BpmRowReport, FlowError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.bpm.check(session.navigator(), id, Some(market)).await {
                Ok(report) => return Ok(report),
                Err(err) => lookup(err),
            };

            let class = self.policy.classify(&err);
            match class {
                FailureClass::Transient { .. } if self.policy.should_retry(attempt) => {
                    metrics::record_retry(class.label());
                    warn!(
                        transaction = %id,
                        attempt,
                        max = self.policy.max_attempts,
                        classification = class.label(),
                        error = %err,
                        "BPM lookup failed, resetting session"
                    );
                    session.reset().await.map_err(FlowError::Session)?;
                    sleep(self.policy.calculate_backoff(attempt)).await;
                }
                _ => return Err(err),
            }
        }
    }
}

