//! Blocking wrapper around [`TriggerClient`]

use crate::config::ClientSettings;
use crate::error::{Result, TriggerError};
use crate::event::TriggerEvent;

use super::transport::{HttpTransport, Transport};
use super::trigger::TriggerClient;

/// Synchronous trigger client
///
/// Owns a current-thread runtime and blocks the caller until the response
/// arrives. Must not be used from inside an async context.
pub struct BlockingTriggerClient<T = HttpTransport> {
    inner: TriggerClient<T>,
    runtime: tokio::runtime::Runtime,
}

impl BlockingTriggerClient<HttpTransport> {
    /// Create a blocking client from resolved settings
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(TriggerClient::from_settings(settings)?)
    }
}

impl<T: Transport> BlockingTriggerClient<T> {
    pub fn new(inner: TriggerClient<T>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self { inner, runtime })
    }

    /// Record a trigger event (blocking)
    pub fn record(&self, event: &TriggerEvent) -> std::result::Result<(), TriggerError> {
        self.runtime.block_on(self.inner.record(event))
    }

    /// Get the wrapped async client
    pub fn client(&self) -> &TriggerClient<T> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTransport {
        status: u16,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn post(
            &self,
            _url: &str,
            _headers: HeaderMap,
            _body: String,
        ) -> std::result::Result<u16, TriggerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status)
        }
    }

    fn blocking_client(
        status: u16,
    ) -> (
        BlockingTriggerClient<Arc<CountingTransport>>,
        Arc<CountingTransport>,
    ) {
        let transport = Arc::new(CountingTransport {
            status,
            calls: AtomicUsize::new(0),
        });
        let inner = TriggerClient::with_transport(
            "testing-key",
            "https://api.focuslab.io/api/v1/",
            transport.clone(),
        )
        .unwrap();
        (BlockingTriggerClient::new(inner).unwrap(), transport)
    }

    #[test]
    fn test_blocking_record_success() {
        let (client, transport) = blocking_client(201);
        client
            .record(&TriggerEvent::new("actor", "viewed", "blog post"))
            .unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.client().api_key(), "testing-key");
    }

    #[test]
    fn test_blocking_record_server_error() {
        let (client, transport) = blocking_client(500);
        let err = client
            .record(&TriggerEvent::new("actor", "viewed", "blog post"))
            .unwrap_err();
        assert!(matches!(err, TriggerError::ServerError));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
