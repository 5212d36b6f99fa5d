//! BPM tracking row verdicts

use serde::{Deserialize, Serialize};

use crate::markers::{CurrentStatus, Environment, StatusTag};

/// Minimum number of columns a BPM result row must carry
pub const BPM_MIN_COLUMNS: usize = 11;

/// Verdict on a BPM row, or on the lookup that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpmRowStatus {
    Invalid,
    ReferenceMismatch,
    Error,
    Failure,
    Success,
    Unknown,
    NotFound,
    TransactionTypeNotDefined,
}

impl BpmRowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BpmRowStatus::Invalid => "invalid",
            BpmRowStatus::ReferenceMismatch => "reference_mismatch",
            BpmRowStatus::Error => "error",
            BpmRowStatus::Failure => "failure",
            BpmRowStatus::Success => "success",
            BpmRowStatus::Unknown => "unknown",
            BpmRowStatus::NotFound => "not_found",
            BpmRowStatus::TransactionTypeNotDefined => "transaction_type_not_defined",
        }
    }

    /// Verdicts that settle the transaction's state without further lookup
    pub fn is_conclusive(&self) -> bool {
        matches!(
            self,
            BpmRowStatus::Success | BpmRowStatus::Failure | BpmRowStatus::Error
        )
    }
}

/// Extracted columns of interest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmRowDetails {
    pub reference: String,
    pub current_status: String,
    pub bpm_status: String,
    pub holding_qm: String,
    pub columns_len: usize,
}

/// Result of validating one BPM row, shaped for the lookup boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmRowReport {
    pub status: BpmRowStatus,
    pub success: bool,
    pub message: String,
    pub environment: Option<Environment>,
    pub details: BpmRowDetails,
}

impl BpmRowReport {
    /// Report for a lookup that never reached row validation
    pub fn without_row(status: BpmRowStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: message.into(),
            environment: None,
            details: BpmRowDetails::default(),
        }
    }

    pub fn finding(&self) -> BpmFinding {
        BpmFinding {
            environment: self.environment,
            verdict: self.status,
            detail: self.message.clone(),
        }
    }
}

/// Summary carried by `LocationResult::FoundInBpm` and the matching outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmFinding {
    pub environment: Option<Environment>,
    pub verdict: BpmRowStatus,
    pub detail: String,
}

fn column(columns: &[String], one_based: usize) -> String {
    columns
        .get(one_based - 1)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Validate a BPM result row (1-based columns: 2 = REFERENCE,
/// 4 = CURRENT STATUS, 10 = HOLDING QM, 11 = STATUS).
pub fn validate_bpm_row(columns: &[String], transaction_id: &str) -> BpmRowReport {
    if columns.len() < BPM_MIN_COLUMNS {
        let mut report = BpmRowReport::without_row(
            BpmRowStatus::Invalid,
            "Insufficient columns returned from BPM.",
        );
        report.details.columns_len = columns.len();
        return report;
    }

    let details = BpmRowDetails {
        reference: column(columns, 2),
        current_status: column(columns, 4),
        holding_qm: column(columns, 10),
        bpm_status: column(columns, 11),
        columns_len: columns.len(),
    };

    if details.reference != transaction_id {
        return BpmRowReport {
            status: BpmRowStatus::ReferenceMismatch,
            success: false,
            message: format!(
                "REFERENCE mismatch: expected {}, got {}",
                transaction_id, details.reference
            ),
            environment: None,
            details,
        };
    }

    let environment = Environment::from_holding_qm(&details.holding_qm);
    let current = CurrentStatus::classify(&details.current_status);
    let status = StatusTag::classify(&details.bpm_status);

    let (verdict, message) = if current == CurrentStatus::Undefined {
        (BpmRowStatus::Error, "CURRENT STATUS is UNDEFINED".to_string())
    } else if status.is_failure() {
        (
            BpmRowStatus::Failure,
            format!("BPM STATUS indicates failure/warning: {}", details.bpm_status),
        )
    } else if status == StatusTag::Success && current.is_recognized() {
        (
            BpmRowStatus::Success,
            format!(
                "Success: CURRENT STATUS='{}', BPM STATUS='{}', ENV='{}'",
                current.label(),
                details.bpm_status,
                environment
            ),
        )
    } else {
        (
            BpmRowStatus::Unknown,
            format!(
                "Unrecognized combination: CURRENT STATUS='{}', BPM STATUS='{}'",
                details.current_status, details.bpm_status
            ),
        )
    };

    BpmRowReport {
        success: verdict == BpmRowStatus::Success,
        status: verdict,
        message,
        environment: Some(environment),
        details,
    }
}
