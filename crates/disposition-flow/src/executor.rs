//! Disposition executor
//!
//! Turns a located transaction into exactly one outcome. Only a live
//! match can be acted on; every other location maps straight to its
//! read-only outcome.

use action_primitives::PageNavigator;
use firco_core_types::{
    Actor, CurrentStatus, DispositionOutcome, Environment, ErrorKind, LiveMatch, LocationResult,
    NoOpReason, StatusMarkers, StatusTag, TransactionRequest,
};
use tracing::{debug, info, warn};
use transaction_locator::{FircoSurface, TransactionLocator};

use crate::errors::FlowError;

/// What the live-row markers allow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Act,
    NoOp(NoOpReason),
    /// FAILURE or WARNING marker, with its text
    Fail(String),
}

/// Apply the business rules to live-row markers, first match wins
pub fn decide(markers: &StatusMarkers) -> Decision {
    if markers.environment == Environment::Buat {
        return Decision::NoOp(NoOpReason::EnvironmentExcluded);
    }
    match markers.current_status {
        CurrentStatus::Undefined => return Decision::NoOp(NoOpReason::UndefinedStatus),
        CurrentStatus::ResponseSent | CurrentStatus::ResponseProcessed => {
            return Decision::NoOp(NoOpReason::ResponseAlreadyIssued)
        }
        CurrentStatus::Posted | CurrentStatus::Unrecognized => {}
    }
    match (markers.status, markers.current_status) {
        (StatusTag::Failure | StatusTag::Warning, _) => Decision::Fail(markers.status_text.clone()),
        (StatusTag::Success, CurrentStatus::Posted) => Decision::Act,
        _ => Decision::NoOp(NoOpReason::NotPosted),
    }
}

/// Acts on located transactions through the Firco surface
#[derive(Debug, Clone)]
pub struct DispositionExecutor {
    locator: TransactionLocator,
}

impl DispositionExecutor {
    pub fn new(locator: TransactionLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &TransactionLocator {
        &self.locator
    }

    fn firco(&self) -> &FircoSurface {
        self.locator.firco()
    }

    /// Execute `request` against `location` as `actor`
    pub async fn execute(
        &self,
        nav: &mut dyn PageNavigator,
        location: LocationResult,
        request: &TransactionRequest,
        actor: Actor,
    ) -> Result<DispositionOutcome, FlowError> {
        let outcome = match location {
            LocationResult::FoundInLive(found) => self.act_on_live(nav, &found, request, actor).await?,
            LocationResult::FoundInHistory if request.force_retry() => {
                info!(transaction = %request.id(), "forced retry, searching live messages again");
                match self.locator.locate_live(nav, request).await? {
                    Some(found) => self.act_on_live(nav, &found, request, actor).await?,
                    None => {
                        debug!(transaction = %request.id(), "forced retry found no live row");
                        DispositionOutcome::AlreadyHandled {
                            reason: NoOpReason::RecordedInHistory,
                        }
                    }
                }
            }
            LocationResult::FoundInHistory => DispositionOutcome::AlreadyHandled {
                reason: NoOpReason::RecordedInHistory,
            },
            LocationResult::FoundInSanctionsBypass => DispositionOutcome::FoundInSanctionsBypass,
            LocationResult::FoundInBpm(finding) => DispositionOutcome::FoundInBpm(finding),
            LocationResult::NotFoundAnywhere => DispositionOutcome::NotFoundInAnyTab,
        };

        info!(
            transaction = %request.id(),
            actor = ?actor,
            status_detail = outcome.status_detail(),
            "disposition decided"
        );
        Ok(outcome)
    }

    async fn act_on_live(
        &self,
        nav: &mut dyn PageNavigator,
        found: &LiveMatch,
        request: &TransactionRequest,
        actor: Actor,
    ) -> Result<DispositionOutcome, FlowError> {
        match decide(&found.markers) {
            Decision::NoOp(reason) => {
                info!(transaction = %request.id(), reason = reason.describe(), "no action taken");
                Ok(DispositionOutcome::AlreadyHandled { reason })
            }
            Decision::Fail(marker) => {
                warn!(transaction = %request.id(), %marker, "status marker reports a failure");
                Ok(DispositionOutcome::failed(
                    ErrorKind::BpmFailure,
                    format!(
                        "Transaction {} status marker reports {}",
                        request.id(),
                        marker
                    ),
                ))
            }
            Decision::Act => self.act(nav, request, actor).await,
        }
    }

    async fn act(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
        actor: Actor,
    ) -> Result<DispositionOutcome, FlowError> {
        let firco = self.firco();
        let action = request.action();

        if !request.comment().is_empty() {
            firco.fill_comment(nav, request.comment()).await?;
        }
        firco.review_hits(nav).await?;

        if actor == Actor::Operator && action.needs_escalation() {
            firco.escalate(nav).await?;
            return Ok(DispositionOutcome::Escalated { action });
        }

        firco.apply_action(nav, action).await?;
        Ok(DispositionOutcome::ActionPerformedOnLive { action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firco_core_types::RawMarkers;

    fn markers(holding_qm: &str, current: &str, status: &str) -> StatusMarkers {
        StatusMarkers::classify(&RawMarkers::new(holding_qm, current, status))
    }

    #[test]
    fn test_rules_in_order() {
        let cases = [
            (
                markers("26", "PostedTxnToFirco", "SUCCESS"),
                Decision::NoOp(NoOpReason::EnvironmentExcluded),
            ),
            (
                markers("12", "UNDEFINED", "FAILURE"),
                Decision::NoOp(NoOpReason::UndefinedStatus),
            ),
            (
                markers("12", "SendResponseToRTPS", "FAILURE"),
                Decision::NoOp(NoOpReason::ResponseAlreadyIssued),
            ),
            (
                markers("12", "BusinessResponseProcessed", "SUCCESS"),
                Decision::NoOp(NoOpReason::ResponseAlreadyIssued),
            ),
            (
                markers("12", "PostedTxnToFirco", "WARNING: partial"),
                Decision::Fail("WARNING: partial".into()),
            ),
            (markers("12", "PostedTxnToFirco", "SUCCESS"), Decision::Act),
            (
                markers("12", "PostedTxnToFirco", ""),
                Decision::NoOp(NoOpReason::NotPosted),
            ),
            (
                markers("12", "Queued", "SUCCESS"),
                Decision::NoOp(NoOpReason::NotPosted),
            ),
        ];
        for (markers, expected) in cases {
            assert_eq!(decide(&markers), expected, "{:?}", markers);
        }
    }

    #[test]
    fn test_every_marker_combination_is_decided() {
        let holding = ["25", "12", ""];
        let current = [
            "UNDEFINED",
            "BusinessResponseProcessed",
            "PostedTxnToFirco",
            "SendResponseTo",
            "Queued",
        ];
        let status = ["SUCCESS", "FAILURE", "WARNING", ""];

        let mut acted = 0;
        for h in holding {
            for c in current {
                for s in status {
                    if decide(&markers(h, c, s)) == Decision::Act {
                        acted += 1;
                    }
                }
            }
        }
        // Only UAT + posted + success proceeds
        assert_eq!(acted, 2);
    }
}
