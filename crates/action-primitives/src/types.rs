//! Core data types shared by navigator implementations

use std::fmt;
use std::path::PathBuf;

use firco_core_types::RequestId;
use serde::{Deserialize, Serialize};

/// Login credentials for one actor
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What a browser session is opened for
#[derive(Debug, Clone)]
pub struct SessionScope {
    /// Correlation id of the owning request
    pub request_id: RequestId,
    /// Short label for logs, usually the transaction identifier
    pub label: String,
    /// Where named screenshots for this request are written
    pub screenshot_dir: PathBuf,
}

impl SessionScope {
    pub fn new(label: impl Into<String>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            request_id: RequestId::new(),
            label: label.into(),
            screenshot_dir: screenshot_dir.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("506", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("506"));
        assert!(!rendered.contains("hunter2"));
        assert!(creds.is_complete());
        assert!(!Credentials::new("506", "").is_complete());
    }
}
