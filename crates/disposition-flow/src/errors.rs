//! Disposition flow error types

use action_primitives::NavError;
use thiserror::Error;
use transaction_locator::LocatorError;

/// Errors raised inside one locate + execute attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Sign-in or search failed before a location was established
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LocatorError),

    /// Acting on a located transaction failed
    #[error("Disposition failed: {0}")]
    Disposition(#[from] NavError),

    /// Opening or resetting the browser session failed
    #[error("Session error: {0}")]
    Session(NavError),
}

impl FlowError {
    /// The navigator error underneath, if any
    pub fn navigation(&self) -> Option<&NavError> {
        match self {
            FlowError::Lookup(err) => err.navigation(),
            FlowError::Disposition(err) | FlowError::Session(err) => Some(err),
        }
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, FlowError::Lookup(_))
    }
}

/// Convert a sign-in or search failure into the lookup phase
pub(crate) fn lookup(err: NavError) -> FlowError {
    FlowError::Lookup(LocatorError::Navigation(err))
}
