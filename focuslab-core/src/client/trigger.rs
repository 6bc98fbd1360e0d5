//! The trigger client itself

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;

use crate::config::{ClientSettings, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result, TriggerError};
use crate::event::{TriggerEvent, TriggerPayload};

use super::transport::{HttpTransport, Transport};

/// Base URL used when no endpoint is configured
pub const DEFAULT_ENDPOINT: &str = "https://api.focuslab.io/api/v1/";

/// Header carrying the pre-shared API key
pub const API_KEY_HEADER: &str = "X-FL-API-KEY";

/// Resource name trigger events are posted to
pub const TRIGGER_RESOURCE: &str = "trigger";

/// Client for the FocusLab trigger API
///
/// Configuration is fixed at construction and every method takes `&self`, so
/// one client can be shared across tasks behind an `Arc`.
#[derive(Clone)]
pub struct TriggerClient<T = HttpTransport> {
    api_key: String,
    api_key_header: HeaderValue,
    endpoint: String,
    transport: T,
}

impl<T: fmt::Debug> fmt::Debug for TriggerClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerClient")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport)
            .finish()
    }
}

impl TriggerClient<HttpTransport> {
    /// Create a client that talks to `endpoint` over HTTP.
    ///
    /// The endpoint is stored as given; configure it with a trailing `/` so
    /// resources are appended rather than replacing the last path segment.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
        Self::with_transport(api_key, endpoint, transport)
    }

    /// Create a client for [`DEFAULT_ENDPOINT`].
    pub fn with_default_endpoint(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, DEFAULT_ENDPOINT)
    }

    /// Create a client from resolved settings, honouring the configured timeout.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(settings.timeout)?;
        Self::with_transport(settings.api_key.clone(), settings.endpoint.clone(), transport)
    }
}

impl<T: Transport> TriggerClient<T> {
    /// Create a client that sends requests through `transport`.
    ///
    /// Returns an error if the API key is empty or cannot be sent as a header.
    pub fn with_transport(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        transport: T,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config("api_key must not be empty".to_string()));
        }

        let mut api_key_header = HeaderValue::from_str(&api_key)
            .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?;
        api_key_header.set_sensitive(true);

        Ok(Self {
            api_key,
            api_key_header,
            endpoint: endpoint.into(),
            transport,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `resource` against the endpoint.
    ///
    /// A trailing `/` is appended to the resource before joining, so
    /// `resolve_url("trigger/32")` against the default endpoint gives
    /// `https://api.focuslab.io/api/v1/trigger/32/`.
    pub fn resolve_url(&self, resource: &str) -> std::result::Result<String, TriggerError> {
        let resource = if resource.ends_with('/') {
            Cow::Borrowed(resource)
        } else {
            Cow::Owned(format!("{}/", resource))
        };

        let base = Url::parse(&self.endpoint).map_err(|e| self.invalid_endpoint(e))?;
        let url = base.join(&resource).map_err(|e| self.invalid_endpoint(e))?;

        Ok(url.to_string())
    }

    fn invalid_endpoint(&self, reason: impl std::fmt::Display) -> TriggerError {
        TriggerError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        }
    }

    /// Shape `event` into the trigger request body.
    pub fn build_payload<'a>(&self, event: &'a TriggerEvent) -> TriggerPayload<'a> {
        TriggerPayload::from(event)
    }

    /// Headers sent with every request.
    pub fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, self.api_key_header.clone());
        headers
    }

    /// Record a trigger event.
    ///
    /// Issues exactly one POST to `<endpoint>trigger/`. Only a 201 response
    /// counts as success; every other outcome is returned as a distinct
    /// [`TriggerError`] and nothing is retried here.
    pub async fn record(&self, event: &TriggerEvent) -> std::result::Result<(), TriggerError> {
        let url = self.resolve_url(TRIGGER_RESOURCE)?;
        let body = self.build_payload(event).to_json();

        let status = self.transport.post(&url, self.build_headers(), body).await?;

        if status == 201 {
            Ok(())
        } else {
            Err(TriggerError::from_status(status))
        }
    }
}
