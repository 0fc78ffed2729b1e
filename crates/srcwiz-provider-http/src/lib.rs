// # HTTP Form Provider
//
// This crate provides the HTTP implementation of `FormProvider` for the
// source configuration wizard.
//
// ## Responsibilities
//
// - ✅ One HTTP request per step transition
// - ✅ Decode the answer once into `StepOutcome` (form / created / empty)
// - ✅ Decode server rejections (`{"errmsg": ...}`) into `Error::Server`
// - ✅ HTTP timeout configured on the client
// - ❌ NO retry logic (a failed step is reported, the user retries)
// - ❌ NO state (busy flags, settings and redirects are owned by `SourceWizard`)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Query a step: POST `/api/source_settings/:source_type/:step[?recall=:token]`
//   with the accumulated settings as JSON body
// - Answer: `{"form": {...}, "redirect": "..."}` or `{"Source": {...}, "redirect": "..."}`
// - Rejection: non-2xx status with `{"errmsg": "..."}`

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use srcwiz_core::traits::{FormProvider, StepOutcome, TransitionRequest};
use srcwiz_core::{CustomForm, Error, ErrorPayload, HttpProviderConfig, Result, SourceRecord};
use std::time::Duration;

/// Path prefix of the source settings endpoint
const SOURCE_SETTINGS_PATH: [&str; 2] = ["api", "source_settings"];

/// Query parameter carrying the recall token
const RECALL_PARAM: &str = "recall";

/// Body of a successful answer
#[derive(Debug, Deserialize)]
struct SettingsResponse {
    #[serde(default)]
    form: Option<CustomForm>,

    #[serde(rename = "Source", default)]
    source: Option<SourceRecord>,

    #[serde(default)]
    redirect: Option<String>,
}

impl From<SettingsResponse> for StepOutcome {
    fn from(response: SettingsResponse) -> Self {
        let redirect = response.redirect;
        match (response.form, response.source) {
            (Some(form), _) => StepOutcome::Form { form, redirect },
            (None, Some(source)) => StepOutcome::Created { source, redirect },
            (None, None) => StepOutcome::Empty { redirect },
        }
    }
}

/// Form provider talking to the source settings API
pub struct HttpFormProvider {
    /// Base URL of the API
    base_url: Url,

    /// Optional bearer token
    /// ⚠️ NEVER log this value
    api_token: Option<String>,

    /// Client timeout, reported when a request expires
    timeout: Duration,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HttpFormProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFormProvider")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpFormProvider {
    /// Create a new HTTP form provider
    ///
    /// # Parameters
    ///
    /// - `config`: Base URL, optional token and client timeout
    ///
    /// # Returns
    ///
    /// - `Ok(HttpFormProvider)`: Ready to use
    /// - `Err(Error)`: Invalid configuration or HTTP client construction failure
    pub fn new(config: &HttpProviderConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("Invalid API base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "API base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            timeout,
            client,
        })
    }

    /// Build the URL of a step query
    fn step_url(&self, request: &TransitionRequest) -> Url {
        let mut url = self.base_url.clone();
        let step = request.step.to_string();

        // Checked in new(): the base URL can carry path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(SOURCE_SETTINGS_PATH)
                .push(&request.provider_type)
                .push(&step);
        }

        if let Some(token) = &request.recall_token {
            url.query_pairs_mut().append_pair(RECALL_PARAM, token);
        }

        url
    }

    /// Map a non-2xx answer to an error
    fn rejection(status: reqwest::StatusCode, body: &str) -> Error {
        if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
            return Error::Server(payload);
        }

        match status.as_u16() {
            401 | 403 => Error::provider(
                "http",
                format!("Authentication failed: missing or invalid session. Status: {}", status),
            ),
            404 => Error::provider("http", format!("Unknown source type or step. Status: {}", status)),
            500..=599 => Error::provider(
                "http",
                format!("Server error (transient): {} - {}", status, body),
            ),
            _ => Error::provider("http", format!("Step rejected: {} - {}", status, body)),
        }
    }
}

#[async_trait]
impl FormProvider for HttpFormProvider {
    /// Query one step of the source settings flow
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /api/source_settings/abstract.OVHAPI/1?recall=8364
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// {"Source": {...}, "_comment": "...", "redirect": null}
    /// ```
    async fn fetch_step(&self, request: &TransitionRequest) -> Result<StepOutcome> {
        let url = self.step_url(request);
        tracing::debug!("Querying source settings step: {}", url.path());

        let mut builder = self.client.post(url).json(&request.settings);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout)
            } else {
                Error::http(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("Source settings step {} rejected: {}", request.step, status);
            return Err(Self::rejection(status, &body));
        }

        // An accepted step with no body asks for nothing
        let outcome = if body.trim().is_empty() {
            StepOutcome::Empty { redirect: None }
        } else {
            StepOutcome::from(serde_json::from_str::<SettingsResponse>(&body)?)
        };
        tracing::debug!("Step {} answered with {}", request.step, outcome.kind());
        Ok(outcome)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Create a boxed HTTP form provider from configuration
pub fn from_config(config: &HttpProviderConfig) -> Result<Box<dyn FormProvider>> {
    Ok(Box::new(HttpFormProvider::new(config)?))
}
