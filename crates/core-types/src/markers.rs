//! Status-marker classification.
//!
//! Raw marker text read from a surface row is parsed exactly once into a
//! closed set of tags; the executor's rule table matches on the tags only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment derived from the HOLDING QM column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    /// Non-production marker; never acted upon
    Buat,
    Uat,
}

impl Environment {
    /// `BUAT` when the first two characters are digits in `25..=30`.
    pub fn from_holding_qm(holding_qm: &str) -> Self {
        let prefix: String = holding_qm.trim().chars().take(2).collect();
        if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(value) = prefix.parse::<u8>() {
                if (25..=30).contains(&value) {
                    return Environment::Buat;
                }
            }
        }
        Environment::Uat
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Buat => "BUAT",
            Environment::Uat => "UAT",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed CURRENT STATUS column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentStatus {
    Undefined,
    /// `BusinessResponseProcessed`
    ResponseProcessed,
    /// `PostedTxnToFirco`
    Posted,
    /// `SendResponseTo*` / `SentResponseTo*`
    ResponseSent,
    Unrecognized,
}

impl CurrentStatus {
    /// Case-insensitive substring match, first hit wins.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("undefined") {
            CurrentStatus::Undefined
        } else if lower.contains("businessresponseprocessed") {
            CurrentStatus::ResponseProcessed
        } else if lower.contains("postedtxntofirco") || lower.contains("postedtxtntofirco") {
            CurrentStatus::Posted
        } else if lower.contains("sendresponseto") || lower.contains("sentresponseto") {
            CurrentStatus::ResponseSent
        } else {
            CurrentStatus::Unrecognized
        }
    }

    /// Human label used in report messages
    pub fn label(&self) -> &'static str {
        match self {
            CurrentStatus::Undefined => "UNDEFINED",
            CurrentStatus::ResponseProcessed => "Response from Firco received",
            CurrentStatus::Posted => "Transaction posted to Firco",
            CurrentStatus::ResponseSent => "NO HIT Transaction",
            CurrentStatus::Unrecognized => "Unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CurrentStatus::Undefined | CurrentStatus::Unrecognized)
    }
}

/// Parsed STATUS column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusTag {
    Success,
    Failure,
    Warning,
    Absent,
}

impl StatusTag {
    /// FAILURE outranks WARNING, which outranks SUCCESS.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("failure") {
            StatusTag::Failure
        } else if lower.contains("warning") {
            StatusTag::Warning
        } else if lower.contains("success") {
            StatusTag::Success
        } else {
            StatusTag::Absent
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StatusTag::Failure | StatusTag::Warning)
    }
}

/// Marker text exactly as read from the surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMarkers {
    pub holding_qm: String,
    pub current_status: String,
    pub status: String,
}

impl RawMarkers {
    pub fn new(
        holding_qm: impl Into<String>,
        current_status: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            holding_qm: holding_qm.into(),
            current_status: current_status.into(),
            status: status.into(),
        }
    }
}

/// Classified markers for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMarkers {
    pub environment: Environment,
    pub current_status: CurrentStatus,
    pub status: StatusTag,
    /// Trimmed STATUS text, carried into failure messages
    pub status_text: String,
}

impl StatusMarkers {
    pub fn classify(raw: &RawMarkers) -> Self {
        Self {
            environment: Environment::from_holding_qm(&raw.holding_qm),
            current_status: CurrentStatus::classify(&raw.current_status),
            status: StatusTag::classify(&raw.status),
            status_text: raw.status.trim().to_string(),
        }
    }
}
