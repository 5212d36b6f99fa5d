//! Terminal outcomes and the failure taxonomy

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bpm::BpmFinding;
use crate::request::DispositionAction;

/// Failure classification carried by `DispositionOutcome::Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    AmbiguousMatch,
    Lookup,
    Automation,
    Permission,
    Connection,
    /// Transient retries exhausted on the reload-loop signature
    ReloadLoop,
    /// Live row carried a FAILURE or WARNING marker
    BpmFailure,
    /// Caller-level request deadline expired
    Deadline,
}

impl ErrorKind {
    /// Stable machine code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::AmbiguousMatch => "AMBIGUOUS_MATCH",
            ErrorKind::Lookup => "LOOKUP_ERROR",
            ErrorKind::Automation => "AUTOMATION_ERROR",
            ErrorKind::Permission => "PERMISSION_ERROR",
            ErrorKind::Connection => "CONNECTION_ERROR",
            ErrorKind::ReloadLoop => "RELOAD_LOOP",
            ErrorKind::BpmFailure => "BPM_FAILURE",
            ErrorKind::Deadline => "DEADLINE_EXCEEDED",
        }
    }

    /// Whether an operator may resubmit with `forceRetry`
    pub fn allows_forced_retry(&self) -> bool {
        matches!(self, ErrorKind::ReloadLoop)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why no action was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    EnvironmentExcluded,
    UndefinedStatus,
    ResponseAlreadyIssued,
    NotPosted,
    RecordedInHistory,
}

impl NoOpReason {
    pub fn describe(&self) -> &'static str {
        match self {
            NoOpReason::EnvironmentExcluded => "environment excluded",
            NoOpReason::UndefinedStatus => "undefined current status",
            NoOpReason::ResponseAlreadyIssued => "response already issued",
            NoOpReason::NotPosted => "transaction not posted to Firco",
            NoOpReason::RecordedInHistory => "already recorded in history",
        }
    }
}

/// Status tags reported at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTag {
    ActionPerformedOnLive,
    Escalated,
    AlreadyHandled,
    FoundInBpm,
    FoundInSanctionsBypass,
    #[serde(rename = "transaction_not_found_in_any_tab")]
    NotFoundInAnyTab,
    Failed,
}

impl OutcomeTag {
    pub const ALL: [OutcomeTag; 7] = [
        OutcomeTag::ActionPerformedOnLive,
        OutcomeTag::Escalated,
        OutcomeTag::AlreadyHandled,
        OutcomeTag::FoundInBpm,
        OutcomeTag::FoundInSanctionsBypass,
        OutcomeTag::NotFoundInAnyTab,
        OutcomeTag::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeTag::ActionPerformedOnLive => "action_performed_on_live",
            OutcomeTag::Escalated => "escalated",
            OutcomeTag::AlreadyHandled => "already_handled",
            OutcomeTag::FoundInBpm => "found_in_bpm",
            OutcomeTag::FoundInSanctionsBypass => "found_in_sanctions_bypass",
            OutcomeTag::NotFoundInAnyTab => "transaction_not_found_in_any_tab",
            OutcomeTag::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of these is produced per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispositionOutcome {
    ActionPerformedOnLive { action: DispositionAction },
    Escalated { action: DispositionAction },
    AlreadyHandled { reason: NoOpReason },
    FoundInBpm(BpmFinding),
    FoundInSanctionsBypass,
    NotFoundInAnyTab,
    Failed { kind: ErrorKind, message: String },
}

impl DispositionOutcome {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        DispositionOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn tag(&self) -> OutcomeTag {
        match self {
            DispositionOutcome::ActionPerformedOnLive { .. } => OutcomeTag::ActionPerformedOnLive,
            DispositionOutcome::Escalated { .. } => OutcomeTag::Escalated,
            DispositionOutcome::AlreadyHandled { .. } => OutcomeTag::AlreadyHandled,
            DispositionOutcome::FoundInBpm(_) => OutcomeTag::FoundInBpm,
            DispositionOutcome::FoundInSanctionsBypass => OutcomeTag::FoundInSanctionsBypass,
            DispositionOutcome::NotFoundInAnyTab => OutcomeTag::NotFoundInAnyTab,
            DispositionOutcome::Failed { .. } => OutcomeTag::Failed,
        }
    }

    pub fn status_detail(&self) -> &'static str {
        self.tag().as_str()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            DispositionOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
