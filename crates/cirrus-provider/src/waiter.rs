//! Polling for asynchronous status transitions
//!
//! Services such as Bedrock Agent accept a request and then move the object
//! through transitional statuses (`CREATING`, `UPDATING`, `DELETING`).
//! [`StateChangeConf`] polls a refresh function until the status reaches a
//! target, leaves the pending set, or the timeout elapses.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::conns::WaitSettings;
use crate::error::{ProviderError, Result};

type ReasonFn<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Waiter configuration for one status transition
pub struct StateChangeConf<T> {
    pub pending: Vec<String>,
    /// Empty target means "wait until the object is gone"
    pub target: Vec<String>,
    pub timeout: Duration,
    pub delay: Duration,
    pub poll_interval: Duration,
    /// Consecutive not-found reads tolerated while a target is expected
    pub not_found_checks: u32,
    reason: Option<ReasonFn<T>>,
}

impl<T> std::fmt::Debug for StateChangeConf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateChangeConf")
            .field("pending", &self.pending)
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .field("delay", &self.delay)
            .field("poll_interval", &self.poll_interval)
            .field("not_found_checks", &self.not_found_checks)
            .finish_non_exhaustive()
    }
}

impl<T> StateChangeConf<T> {
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Self {
        let settings = WaitSettings::default();
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            delay: settings.delay,
            poll_interval: settings.poll_interval,
            not_found_checks: 20,
            reason: None,
        }
    }

    pub fn with_settings(mut self, settings: WaitSettings) -> Self {
        self.delay = settings.delay;
        self.poll_interval = settings.poll_interval;
        self
    }

    /// Extract a failure explanation when the status leaves the expected set
    pub fn with_failure_reason<F>(mut self, reason: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.reason = Some(Box::new(reason));
        self
    }

    /// Poll `refresh` until the object reaches a target status
    ///
    /// `refresh` returns `None` when the object does not exist, otherwise
    /// the object and its current status. Returns the last object seen, or
    /// `None` when waiting for deletion succeeded.
    pub async fn wait_for_state<F, Fut>(&self, mut refresh: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut not_found = 0u32;
        let mut last_status = String::new();

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        loop {
            match refresh().await? {
                None if self.target.is_empty() => {
                    debug!("object is gone");
                    return Ok(None);
                }
                None => {
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(ProviderError::UnexpectedState {
                            state: "not found".to_string(),
                            expected: self.target.clone(),
                            reason: Some(format!("object not found after {} checks", not_found)),
                        });
                    }
                }
                Some((value, status)) => {
                    not_found = 0;
                    trace!(status = %status, "polled status");

                    if self.target.contains(&status) {
                        return Ok(Some(value));
                    }
                    if !self.pending.contains(&status) {
                        return Err(ProviderError::UnexpectedState {
                            reason: self.reason.as_ref().and_then(|reason| reason(&value)),
                            state: status,
                            expected: self.target.clone(),
                        });
                    }
                    last_status = status;
                }
            }

            if Instant::now() >= deadline {
                return Err(ProviderError::WaitTimeout {
                    target: self.target.clone(),
                    last_status,
                    timeout: self.timeout,
                });
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn conf(pending: &[&str], target: &[&str], timeout: Duration) -> StateChangeConf<&'static str> {
        StateChangeConf::new(pending, target, timeout).with_settings(WaitSettings::immediate())
    }

    #[tokio::test]
    async fn test_reaches_target() {
        let polls = AtomicUsize::new(0);
        let statuses = ["CREATING", "CREATING", "ACTIVE"];

        let result = conf(&["CREATING"], &["ACTIVE"], Duration::from_secs(5))
            .wait_for_state(|| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(Some(("kb", statuses[n].to_string()))) }
            })
            .await
            .unwrap();

        assert_eq!(result, Some("kb"));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gone_satisfies_empty_target() {
        let result = conf(&["DELETING"], &[], Duration::from_secs(5))
            .wait_for_state(|| async { Ok(None) })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unexpected_status_carries_reason() {
        let err = conf(&["CREATING"], &["ACTIVE"], Duration::from_secs(5))
            .with_failure_reason(|_| Some("role cannot be assumed".to_string()))
            .wait_for_state(|| async { Ok(Some(("kb", "FAILED".to_string()))) })
            .await
            .unwrap_err();

        match err {
            ProviderError::UnexpectedState { state, reason, .. } => {
                assert_eq!(state, "FAILED");
                assert_eq!(reason.as_deref(), Some("role cannot be assumed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_reports_last_status() {
        let err = conf(&["UPDATING"], &["ACTIVE"], Duration::from_millis(20))
            .wait_for_state(|| async { Ok(Some(("kb", "UPDATING".to_string()))) })
            .await
            .unwrap_err();

        match err {
            ProviderError::WaitTimeout { last_status, target, .. } => {
                assert_eq!(last_status, "UPDATING");
                assert_eq!(target, vec!["ACTIVE"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_limit() {
        let mut waiter = conf(&["CREATING"], &["ACTIVE"], Duration::from_secs(5));
        waiter.not_found_checks = 2;

        let err = waiter.wait_for_state(|| async { Ok(None) }).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedState { .. }));
    }
}
