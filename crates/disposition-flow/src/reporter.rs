//! Result reporter
//!
//! Normalizes every terminal outcome into the response body handed to the
//! HTTP and file layers. Pure: the completion time comes from the caller.

use chrono::{DateTime, TimeZone};
use firco_core_types::{DispositionOutcome, ErrorKind};
use serde::{Deserialize, Serialize};

/// Machine code for `transaction_not_found_in_any_tab`
pub const NOT_FOUND_CODE: &str = "TRANSACTION_NOT_FOUND";

/// Caller-facing result of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispositionReport {
    pub success: bool,
    pub status: String,
    #[serde(rename = "status_detail")]
    pub status_detail: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl DispositionReport {
    pub fn is_validation_error(&self) -> bool {
        self.error_code.as_deref() == Some(ErrorKind::Validation.code())
    }
}

/// Receipt id handed back on success
pub fn receipt<Tz: TimeZone>(completed_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("TXN-{}", completed_at.format("%Y%m%d%H%M%S"))
}

/// Map `outcome` for `identifier` to its report
pub fn report<Tz: TimeZone>(
    outcome: &DispositionOutcome,
    identifier: &str,
    completed_at: &DateTime<Tz>,
) -> DispositionReport
where
    Tz::Offset: std::fmt::Display,
{
    let (message, error_code) = match outcome {
        DispositionOutcome::ActionPerformedOnLive { action } => (
            format!(
                "Action {} performed on transaction {} found in Live Messages.",
                action, identifier
            ),
            None,
        ),
        DispositionOutcome::Escalated { action } => (
            format!(
                "Transaction {} found in Live Messages and escalated for action '{}'.",
                identifier, action
            ),
            None,
        ),
        DispositionOutcome::AlreadyHandled { reason } => (
            format!(
                "Transaction {} requires no action: {}.",
                identifier,
                reason.describe()
            ),
            None,
        ),
        DispositionOutcome::FoundInBpm(finding) => (
            format!(
                "Transaction {} found in BPM ({}): {}",
                identifier,
                finding.verdict.as_str(),
                finding.detail
            ),
            None,
        ),
        DispositionOutcome::FoundInSanctionsBypass => (
            format!(
                "Transaction {} found in Sanctions Bypass View. No further action taken by this process.",
                identifier
            ),
            None,
        ),
        DispositionOutcome::NotFoundInAnyTab => (
            format!(
                "Transaction {} not found in any relevant tab after checking Live, History, Sanctions Bypass, and BPM.",
                identifier
            ),
            Some(NOT_FOUND_CODE.to_string()),
        ),
        DispositionOutcome::Failed { kind, message } => (message.clone(), Some(kind.code().to_string())),
    };

    let success = error_code.is_none();
    DispositionReport {
        success,
        status: if success { "ok" } else { "error" }.to_string(),
        status_detail: outcome.status_detail().to_string(),
        message,
        transaction_id: success.then(|| receipt(completed_at)),
        error_code,
    }
}
