//! # focuslab-core
//!
//! Client library for the FocusLab trigger API.
//!
//! This library provides:
//! - [`TriggerClient`]: builds trigger requests and maps the response status
//!   onto a typed [`TriggerError`]
//! - [`BlockingTriggerClient`] for callers without an async runtime
//! - [`RetryScheduler`] for retrying transient failures in the background
//! - Configuration management (config file, `FL_API_KEY` / `FL_ENDPOINT`)
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use focuslab_core::{Config, TriggerClient, TriggerEvent};
//!
//! # async fn run() -> focuslab_core::Result<()> {
//! let config = Config::load()?;
//! let settings = config.api.with_env_overrides().resolve(None, None)?;
//! let client = TriggerClient::from_settings(&settings)?;
//!
//! let event = TriggerEvent::new(42, "viewed", "blog post")
//!     .identity("email", "user@example.com")
//!     .variable("author", "bob");
//! client.record(&event).await?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use client::{
    BlockingTriggerClient, HttpTransport, Transport, TriggerClient, DEFAULT_ENDPOINT,
};
pub use config::{ClientSettings, Config};
pub use error::{Error, Result, TriggerError};
pub use event::{IdentityValue, TriggerEvent, TriggerPayload};
pub use retry::{RetryPolicy, RetryScheduler};

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod retry;
