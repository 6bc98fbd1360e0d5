//! Background retries for trigger requests
//!
//! [`TriggerClient::record`] never retries. The scheduler here runs it on a
//! tokio task and re-invokes it when the failure is transient (see
//! [`TriggerError::is_retryable`]), doubling the delay between attempts.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::{HttpTransport, Transport, TriggerClient};
use crate::config::RetryConfig;
use crate::error::TriggerError;
use crate::event::TriggerEvent;

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap for the doubling delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = std::cmp::min(delay.saturating_mul(2), self.max_delay);
        }
        std::cmp::min(delay, self.max_delay)
    }
}

/// Runs trigger requests in the background and retries transient failures
pub struct RetryScheduler<T = HttpTransport> {
    client: Arc<TriggerClient<T>>,
    policy: RetryPolicy,
}

impl<T> Clone for RetryScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            policy: self.policy,
        }
    }
}

impl<T: Transport + 'static> RetryScheduler<T> {
    pub fn new(client: Arc<TriggerClient<T>>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Spawn a task that records `event`, retrying transient failures.
    ///
    /// Must be called from within a tokio runtime. The handle resolves to the
    /// final outcome: success, the first terminal error, or the last
    /// transient error once retries are exhausted.
    pub fn schedule(&self, event: TriggerEvent) -> JoinHandle<Result<(), TriggerError>> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(&event).await })
    }

    /// Record `event` in the current task, retrying transient failures.
    pub async fn run(&self, event: &TriggerEvent) -> Result<(), TriggerError> {
        let mut attempt = 0;

        loop {
            match self.client.record(event).await {
                Ok(()) => {
                    tracing::debug!(
                        actor_id = %event.actor_id,
                        action = %event.action,
                        attempts = attempt + 1,
                        "Recorded trigger"
                    );
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    if let TriggerError::UnknownError { status } = e {
                        tracing::warn!(status, "Unexpected status from FocusLab; please report");
                    }
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_retries + 1,
                        ?delay,
                        "Transient error recording trigger, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        actor_id = %event.actor_id,
                        action = %event.action,
                        retryable = e.is_retryable(),
                        "Failed to record trigger"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays a scripted list of outcomes
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<u16, TriggerError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<u16, TriggerError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(
            &self,
            _url: &str,
            _headers: HeaderMap,
            _body: String,
        ) -> Result<u16, TriggerError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(201))
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn scheduler(
        outcomes: Vec<Result<u16, TriggerError>>,
        max_retries: usize,
    ) -> (RetryScheduler<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(outcomes);
        let client = TriggerClient::with_transport(
            "testing-key",
            "https://api.focuslab.io/api/v1/",
            transport.clone(),
        )
        .unwrap();
        (
            RetryScheduler::new(Arc::new(client), fast_policy(max_retries)),
            transport,
        )
    }

    fn event() -> TriggerEvent {
        crate::logging::init_test();
        TriggerEvent::new(42, "viewed", "blog post")
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(3));
        assert_eq!(policy.delay_for(9), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let (scheduler, transport) = scheduler(vec![Ok(500), Ok(503)], 3);

        scheduler.run(&event()).await.unwrap();
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_transport_errors() {
        let (scheduler, transport) = scheduler(
            vec![Err(TriggerError::Transport("connection refused".to_string()))],
            3,
        );

        scheduler.run(&event()).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_terminal_errors_are_not_retried() {
        let (scheduler, transport) = scheduler(vec![Ok(401)], 3);

        let err = scheduler.run(&event()).await.unwrap_err();
        assert!(matches!(err, TriggerError::BadApiKey { status: 401 }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (scheduler, transport) = scheduler(vec![Ok(500), Ok(500), Ok(500), Ok(500)], 2);

        let err = scheduler.run(&event()).await.unwrap_err();
        assert!(matches!(err, TriggerError::ServerError));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_schedule_runs_in_background() {
        let (scheduler, transport) = scheduler(vec![Ok(417)], 3);

        let handle = scheduler.schedule(event());
        handle.await.unwrap().unwrap();
        assert_eq!(transport.calls(), 2);
    }
}
