//! Failure classification and retry policy

use std::time::Duration;

use action_primitives::NavError;
use firco_core_types::ErrorKind;
use transaction_locator::LocatorError;

use crate::errors::FlowError;

/// Default messages identifying the page re-rendering under the automation
pub const DEFAULT_RELOAD_SIGNATURES: [&str; 3] = [
    "reload",
    "execution context was destroyed",
    "frame was detached",
];

/// Bounds applied to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Base delay before a retry, doubled per attempt
    pub backoff: Duration,
    /// Case-insensitive message fragments marking a reload loop
    pub reload_signatures: Vec<String>,
    /// Deadline for the whole request, retries included
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(3),
            reload_signatures: DEFAULT_RELOAD_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            deadline: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Check if another attempt may follow attempt number `attempt`
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Exponential backoff: backoff * 2^(attempt-1), capped at 60 seconds
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.backoff.as_millis().min(u64::MAX as u128) as u64;
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
        let total_ms = base_ms.saturating_mul(multiplier);
        Duration::from_millis(total_ms.min(60_000))
    }

    fn is_reload_loop(&self, err: &NavError) -> bool {
        matches!(err, NavError::Timeout(_) | NavError::Interaction(_))
            && err.matches_any(&self.reload_signatures)
    }

    /// Classify a failed attempt
    pub fn classify(&self, err: &FlowError) -> FailureClass {
        if let FlowError::Lookup(LocatorError::AmbiguousMatch { .. }) = err {
            return FailureClass::Fatal(ErrorKind::AmbiguousMatch);
        }
        if let FlowError::Session(nav) = err {
            return match nav {
                NavError::PermissionDenied(_) => FailureClass::Fatal(ErrorKind::Permission),
                _ => FailureClass::Fatal(ErrorKind::Connection),
            };
        }
        let Some(nav) = err.navigation() else {
            return FailureClass::Fatal(ErrorKind::Automation);
        };

        if self.is_reload_loop(nav) {
            return FailureClass::Transient { reload_loop: true };
        }
        match nav {
            NavError::Timeout(_) if err.is_lookup() => FailureClass::Transient { reload_loop: false },
            NavError::PermissionDenied(_) => FailureClass::Fatal(ErrorKind::Permission),
            NavError::Connection(_) | NavError::SessionClosed(_) => {
                FailureClass::Fatal(ErrorKind::Connection)
            }
            NavError::Timeout(_)
            | NavError::NotFound(_)
            | NavError::Interaction(_)
            | NavError::Internal(_) => FailureClass::Fatal(ErrorKind::Automation),
        }
    }
}

/// How the controller reacts to a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Reset the session and try again while attempts remain
    Transient { reload_loop: bool },
    /// Stop immediately with this kind
    Fatal(ErrorKind),
}

impl FailureClass {
    pub fn label(&self) -> &'static str {
        match self {
            FailureClass::Transient { reload_loop: true } => "reload_loop",
            FailureClass::Transient { reload_loop: false } => "lookup_timeout",
            FailureClass::Fatal(_) => "fatal",
        }
    }
}
