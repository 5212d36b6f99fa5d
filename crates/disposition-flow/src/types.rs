//! Core types for the disposition flow

use action_primitives::Credentials;
use firco_core_types::DispositionOutcome;
use serde::{Deserialize, Serialize};

use crate::strategies::FailureClass;

/// Controller state for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    #[default]
    Idle,
    Attempting,
    RetryPending,
    Success,
    Exhausted,
}

/// Per-request retry bookkeeping, discarded once the request completes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    attempts: u32,
    phase: RetryPhase,
    last_error: Option<String>,
    reload_loop: bool,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the most recent transient failure carried the reload-loop signature
    pub fn reload_loop(&self) -> bool {
        self.reload_loop
    }

    /// Enter `Attempting`; returns the attempt number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.phase = RetryPhase::Attempting;
        self.attempts
    }

    pub fn record_failure(&mut self, message: impl Into<String>, class: FailureClass) {
        self.last_error = Some(message.into());
        if let FailureClass::Transient { reload_loop } = class {
            self.reload_loop = reload_loop;
        }
    }

    pub fn retry_pending(&mut self) {
        self.phase = RetryPhase::RetryPending;
    }

    pub fn succeed(&mut self) {
        self.phase = RetryPhase::Success;
    }

    pub fn exhaust(&mut self) {
        self.phase = RetryPhase::Exhausted;
    }
}

/// Who signs in for each pass
#[derive(Debug, Clone, Default)]
pub struct Actors {
    pub operator: Credentials,
    /// Applies escalated actions; without one, escalation is terminal
    pub manager: Option<Credentials>,
}

impl Actors {
    pub fn new(operator: Credentials) -> Self {
        Self {
            operator,
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: Credentials) -> Self {
        self.manager = Some(manager).filter(Credentials::is_complete);
        self
    }
}

/// Terminal outcome of one request plus how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: DispositionOutcome,
    pub retry: RetryState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use firco_core_types::ErrorKind;

    #[test]
    fn test_attempts_only_increase() {
        let mut state = RetryState::new();
        assert_eq!(state.phase(), RetryPhase::Idle);

        assert_eq!(state.begin_attempt(), 1);
        state.record_failure("reload", FailureClass::Transient { reload_loop: true });
        state.retry_pending();
        assert_eq!(state.phase(), RetryPhase::RetryPending);
        assert!(state.reload_loop());

        assert_eq!(state.begin_attempt(), 2);
        state.record_failure("denied", FailureClass::Fatal(ErrorKind::Permission));
        state.exhaust();
        assert_eq!(state.attempts(), 2);
        assert_eq!(state.last_error(), Some("denied"));
        assert!(state.reload_loop());
    }

    #[test]
    fn test_incomplete_manager_is_ignored() {
        let actors = Actors::new(Credentials::new("506", "pw")).with_manager(Credentials::new("507", ""));
        assert!(actors.manager.is_none());
    }
}
