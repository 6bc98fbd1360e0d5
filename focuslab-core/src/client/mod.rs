//! FocusLab trigger client
//!
//! [`TriggerClient`] owns the API key and endpoint, shapes trigger payloads
//! and maps the HTTP status of each request onto a [`TriggerError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use focuslab_core::{TriggerClient, TriggerEvent};
//!
//! # async fn run() -> focuslab_core::Result<()> {
//! let client = TriggerClient::with_default_endpoint("fl_live_xxxx")?;
//! let event = TriggerEvent::new(42, "viewed", "blog post").attribute("plan", "basic");
//! client.record(&event).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Each `record` call issues exactly one request. Retrying transient failures
//! is left to [`crate::retry::RetryScheduler`].
//!
//! [`TriggerError`]: crate::error::TriggerError

mod blocking;
mod transport;
mod trigger;

pub use blocking::BlockingTriggerClient;
pub use transport::{HttpTransport, Transport};
pub use trigger::{TriggerClient, API_KEY_HEADER, DEFAULT_ENDPOINT, TRIGGER_RESOURCE};
