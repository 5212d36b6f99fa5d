//! Built-in waiting policy

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{NavError, NavResult};

/// Timeouts applied by the surfaces to every explicit wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Wait for a single element to reach a state
    pub element_timeout: Duration,

    /// Wait for a page load after navigation or login
    pub load_timeout: Duration,

    /// Delay after actions that trigger a grid re-render
    pub settle: Duration,

    /// Interval between checks while polling
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_secs(10),
            load_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    /// Policy with no settle delay, for in-memory navigators
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

/// Repeatedly run `check` until it yields `true` or `timeout` elapses.
///
/// Errors accepted by `tolerate` count as "not yet" and the last one is
/// kept in the timeout message. Any other error aborts the wait.
pub async fn poll_until<F, Fut, T>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    tolerate: T,
    mut check: F,
) -> NavResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = NavResult<bool>>,
    T: Fn(&NavError) -> bool,
{
    let mut tolerated: Option<NavError> = None;
    let wait = async {
        loop {
            match check().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) if tolerate(&err) => {
                    debug!(what, %err, "check failed, still waiting");
                    tolerated = Some(err);
                }
                Err(err) => return Err(err),
            }
            tokio::time::sleep(interval).await;
        }
    };

    let outcome = tokio::time::timeout(timeout, wait).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            debug!(what, ?timeout, "wait timed out");
            let mut message = format!("waiting for {} exceeded {}ms", what, timeout.as_millis());
            if let Some(err) = tolerated {
                message.push_str(&format!(" (last error: {})", err));
            }
            Err(NavError::Timeout(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_wait_policy_config() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.element_timeout, Duration::from_secs(10));
        assert_eq!(policy.load_timeout, Duration::from_secs(30));
        assert_eq!(WaitPolicy::immediate().settle, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_poll_until_succeeds_after_some_checks() {
        let counter = AtomicUsize::new(0);
        let checks = &counter;
        let result = poll_until(
            "grid",
            Duration::from_secs(1),
            Duration::from_millis(1),
            |_| false,
            || async move { Ok(checks.fetch_add(1, Ordering::SeqCst) >= 2) },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let result = poll_until(
            "#never",
            Duration::from_millis(20),
            Duration::from_millis(5),
            |_| false,
            || async { Ok(false) },
        )
        .await;
        match result {
            Err(NavError::Timeout(message)) => assert!(message.contains("#never")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_check_error_aborts_wait() {
        let result = tokio_test::block_on(poll_until(
            "#grid",
            Duration::from_secs(1),
            Duration::from_millis(1),
            |_| false,
            || async { Err(NavError::SessionClosed("gone".into())) },
        ));
        assert_eq!(result, Err(NavError::SessionClosed("gone".into())));
    }

    fn rerendering(err: &NavError) -> bool {
        matches!(err, NavError::Interaction(message) if message.contains("re-render"))
    }

    #[tokio::test]
    async fn test_tolerated_errors_keep_the_wait_alive() {
        let counter = AtomicUsize::new(0);
        let checks = &counter;
        let result = poll_until(
            "#grid",
            Duration::from_secs(1),
            Duration::from_millis(1),
            rerendering,
            || async move {
                match checks.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(NavError::Interaction("grid re-render".into())),
                    _ => Ok(true),
                }
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_keeps_the_last_tolerated_error() {
        let result = poll_until(
            "#grid",
            Duration::from_millis(20),
            Duration::from_millis(2),
            rerendering,
            || async { Err(NavError::Interaction("grid re-render".into())) },
        )
        .await;
        match result {
            Err(NavError::Timeout(message)) => {
                assert!(message.contains("#grid"));
                assert!(message.contains("last error: Interaction failed: grid re-render"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_untolerated_errors_still_abort() {
        let result = poll_until(
            "#grid",
            Duration::from_secs(1),
            Duration::from_millis(1),
            rerendering,
            || async { Err(NavError::Interaction("button disabled".into())) },
        )
        .await;
        assert_eq!(result, Err(NavError::Interaction("button disabled".into())));
    }
}
