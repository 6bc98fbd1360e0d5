//! HTTP transport used by the trigger client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::{Error, Result, TriggerError};

/// Issues a single POST and reports the response status.
///
/// The trigger client only needs the status code, so the response body is
/// never read.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> std::result::Result<u16, TriggerError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests expire after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> std::result::Result<u16, TriggerError> {
        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> std::result::Result<u16, TriggerError> {
        (**self).post(url, headers, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(Duration::from_secs(5)).is_ok());
    }
}
