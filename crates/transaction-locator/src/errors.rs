//! Error types for transaction lookup

use action_primitives::NavError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Several live rows match and the caller did not ask for the latest
    #[error("Multiple transactions found for {identifier} ({count} rows)")]
    AmbiguousMatch { identifier: String, count: usize },

    /// The page navigator failed while searching or acting
    #[error(transparent)]
    Navigation(#[from] NavError),
}

impl LocatorError {
    pub fn navigation(&self) -> Option<&NavError> {
        match self {
            LocatorError::Navigation(err) => Some(err),
            LocatorError::AmbiguousMatch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_match_carries_no_navigation_error() {
        let err = LocatorError::AmbiguousMatch {
            identifier: "TXN123".into(),
            count: 3,
        };
        assert!(err.navigation().is_none());
        assert_eq!(
            err.to_string(),
            "Multiple transactions found for TXN123 (3 rows)"
        );
    }

    #[test]
    fn test_navigation_errors_stay_reachable() {
        let err: LocatorError = NavError::Timeout("waiting for row".into()).into();
        assert!(err.navigation().is_some_and(NavError::is_timeout));
        assert_eq!(err.to_string(), "Timeout: waiting for row");

        let err: LocatorError = NavError::PermissionDenied("user 506".into()).into();
        assert_eq!(
            err.navigation(),
            Some(&NavError::PermissionDenied("user 506".into()))
        );
    }
}
