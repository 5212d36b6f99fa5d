//! Error types for page navigation

use thiserror::Error;

/// Failures reported by a [`crate::PageNavigator`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    /// A wait or navigation exceeded its timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The selector matched nothing when something was required
    #[error("Element not found: {0}")]
    NotFound(String),

    /// The element exists but the interaction failed
    #[error("Interaction failed: {0}")]
    Interaction(String),

    /// The logged-in user may not use this surface or action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Browser or remote system unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The session was closed underneath the caller
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NavError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NavError::Timeout(_))
    }

    /// Case-insensitive check of the message against any signature
    pub fn matches_any<S: AsRef<str>>(&self, signatures: &[S]) -> bool {
        let message = self.to_string().to_ascii_lowercase();
        signatures.iter().any(|signature| {
            let signature = signature.as_ref().trim();
            !signature.is_empty() && message.contains(&signature.to_ascii_lowercase())
        })
    }
}

pub type NavResult<T> = Result<T, NavError>;
