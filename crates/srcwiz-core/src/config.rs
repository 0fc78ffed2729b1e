//! Configuration types for the source wizard
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder substituted with the escaped source identifier
pub const SOURCE_ID_PLACEHOLDER: &str = "{id}";

/// Wizard controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Maximum time to wait for the form provider (in seconds)
    ///
    /// When exceeded the transition fails like any other provider error,
    /// which clears the busy flags.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long notifications stay visible (in milliseconds)
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,

    /// Capacity of the wizard event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Label used in notifications when the created source has no comment
    #[serde(default = "default_source_label")]
    pub default_source_label: String,

    /// Path of a source's detail view, `{id}` is replaced with the escaped identifier
    #[serde(default = "default_source_detail_path")]
    pub source_detail_path: String,
}

impl WizardConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            notification_duration_ms: default_notification_duration_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            default_source_label: default_source_label(),
            source_detail_path: default_source_detail_path(),
        }
    }

    /// Set the provider request timeout
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if !self.source_detail_path.contains(SOURCE_ID_PLACEHOLDER) {
            return Err(crate::Error::config(format!(
                "Source detail path must contain {}: {}",
                SOURCE_ID_PLACEHOLDER, self.source_detail_path
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    /// Build the detail path of a source from its raw identifier
    pub fn detail_path(&self, source_id: &str) -> String {
        self.source_detail_path
            .replace(SOURCE_ID_PLACEHOLDER, &urlencoding::encode(source_id))
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP form provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    /// Base URL of the API (e.g. "https://dns.example.com")
    pub base_url: String,

    /// Optional bearer token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_token: Option<String>,

    /// HTTP client timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpProviderConfig {
    /// Create a configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Attach a bearer token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("API base URL cannot be empty"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }
        if self.api_token.as_deref() == Some("") {
            return Err(crate::Error::config("API token cannot be empty when set"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HttpProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_notification_duration_ms() -> u64 {
    5000
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_source_label() -> String {
    "Your new source".to_string()
}

fn default_source_detail_path() -> String {
    "/sources/{id}/domains".to_string()
}
