// # srcwiz - Source Configuration Wizard
//
// Terminal front-end driving the server-side source configuration flow.
//
// This binary is a THIN integration layer:
// - All wizard logic (steps, busy flags, redirects, notifications) lives in srcwiz-core
// - The HTTP transport lives in srcwiz-provider-http
// - Configuration is via environment variables ONLY
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP provider and the terminal sinks into the wizard
// 4. Prompting for each form until the source is saved or the wizard is left
//
// ## Configuration
//
// - `SRCWIZ_API_URL`: Base URL of the API (required)
// - `SRCWIZ_API_TOKEN`: Bearer token (optional)
// - `SRCWIZ_PROVIDER_TYPE`: Source type to configure, e.g. `abstract.OVHAPI` (required)
// - `SRCWIZ_SOURCE_ID`: Identifier of an existing source to edit (optional)
// - `SRCWIZ_RECALL`: Recall token resuming an interrupted flow (optional)
// - `SRCWIZ_COMMENT`: Display name of the source (optional)
// - `SRCWIZ_REQUEST_TIMEOUT_SECS`: Per-step timeout, 1 to 300 (default: 30)
// - `SRCWIZ_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export SRCWIZ_API_URL=https://dns.example.com
// export SRCWIZ_PROVIDER_TYPE=abstract.OVHAPI
//
// srcwiz
// ```

mod terminal;

use anyhow::Result;
use serde_json::Value;
use srcwiz_core::traits::Navigator;
use srcwiz_core::{HttpProviderConfig, SourceWizard, StepCallbacks, TransitionOutcome, WizardConfig};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use terminal::{FormAction, Prompter, TerminalNavigator, TerminalNotifier};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Wizard completed or left by the user
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SrcwizExitCode {
    /// Normal exit
    Done = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<SrcwizExitCode> for ExitCode {
    fn from(code: SrcwizExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_url: String,
    api_token: Option<String>,
    provider_type: String,
    source_id: Option<String>,
    recall: Option<String>,
    comment: Option<String>,
    request_timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let request_timeout_secs = match env::var("SRCWIZ_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                anyhow::anyhow!("SRCWIZ_REQUEST_TIMEOUT_SECS must be a number. Got: {}", raw)
            })?),
            Err(_) => None,
        };

        Ok(Self {
            api_url: env::var("SRCWIZ_API_URL").unwrap_or_default(),
            api_token: env::var("SRCWIZ_API_TOKEN").ok(),
            provider_type: env::var("SRCWIZ_PROVIDER_TYPE").unwrap_or_default(),
            source_id: env::var("SRCWIZ_SOURCE_ID").ok(),
            recall: env::var("SRCWIZ_RECALL").ok().filter(|s| !s.is_empty()),
            comment: env::var("SRCWIZ_COMMENT").ok().filter(|s| !s.is_empty()),
            request_timeout_secs,
            log_level: env::var("SRCWIZ_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!(
                "SRCWIZ_API_URL is required. \
                Set it via: export SRCWIZ_API_URL=https://dns.example.com"
            );
        }

        if self.provider_type.is_empty() {
            anyhow::bail!(
                "SRCWIZ_PROVIDER_TYPE is required. \
                Set it via: export SRCWIZ_PROVIDER_TYPE=abstract.OVHAPI"
            );
        }

        if self.provider_type.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "SRCWIZ_PROVIDER_TYPE cannot contain whitespace. Got: '{}'",
                self.provider_type
            );
        }

        if let Some(id) = &self.source_id
            && id.trim().is_empty()
        {
            anyhow::bail!("SRCWIZ_SOURCE_ID cannot be empty when set");
        }

        if let Some(timeout) = self.request_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "SRCWIZ_REQUEST_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        self.provider_config().validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SRCWIZ_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn provider_config(&self) -> HttpProviderConfig {
        let mut config = HttpProviderConfig::new(self.api_url.trim_end_matches('/'));
        if let Some(token) = &self.api_token {
            config = config.with_api_token(token.clone());
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.timeout_secs = timeout;
        }
        config
    }

    fn wizard_config(&self) -> WizardConfig {
        match self.request_timeout_secs {
            Some(timeout) => WizardConfig::new().with_request_timeout_secs(timeout),
            None => WizardConfig::new(),
        }
    }

    /// Numeric identifiers are sent as numbers, anything else as a string
    fn source_id_value(&self) -> Option<Value> {
        let id = self.source_id.as_deref()?.trim();
        Some(match id.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(id),
        })
    }

    /// Location of the wizard itself; leaving it ends the session
    fn start_path(&self) -> String {
        match &self.source_id {
            Some(id) => format!("/sources/{}/settings", id.trim()),
            None => format!("/sources/new/{}", self.provider_type),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SrcwizExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SrcwizExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so they do not interleave with the prompts
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SrcwizExitCode::ConfigError.into();
    }

    info!("Starting srcwiz for source type {}", config.provider_type);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SrcwizExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_wizard(config).await {
            error!("Wizard error: {}", e);
            SrcwizExitCode::RuntimeError
        } else {
            SrcwizExitCode::Done
        }
    })
    .into()
}

/// Drive the wizard until the source is saved or the user leaves
async fn run_wizard(config: Config) -> Result<()> {
    let provider = srcwiz_provider_http::from_config(&config.provider_config())?;
    let start_path = config.start_path();
    let navigator = Arc::new(TerminalNavigator::new(start_path.clone()));

    let (wizard, events) = SourceWizard::new(
        provider,
        Arc::new(TerminalNotifier),
        navigator.clone(),
        config.wizard_config(),
    )?;

    tokio::spawn(async move {
        let mut events = ReceiverStream::new(events);
        while let Some(event) = events.next().await {
            debug!("Wizard event: {:?}", event);
        }
    });

    wizard.select_provider_type(config.provider_type.clone());

    let mount = match config.source_id_value() {
        Some(id) => wizard.mount_existing(id, config.recall.clone()),
        None => wizard.mount(config.recall.clone()),
    };
    let Some(mount) = mount else {
        anyhow::bail!("Nothing to load for source type {}", config.provider_type);
    };

    if let Some(comment) = &config.comment {
        wizard.set_comment(comment.clone());
    }

    let mut outcome = mount.await?;
    let mut prompter = Prompter::stdin();

    loop {
        if navigator.current_path() != start_path {
            return Ok(());
        }

        match &outcome {
            TransitionOutcome::Created(_) => return Ok(()),
            TransitionOutcome::Skipped => anyhow::bail!("No source type selected"),
            TransitionOutcome::Failed(payload) if wizard.state().current_form.is_none() => {
                anyhow::bail!("Could not load the first step: {}", payload.errmsg)
            }
            _ => {}
        }

        let Some(form) = wizard.state().current_form else {
            anyhow::bail!("The server returned no form to fill");
        };
        let editing = wizard.settings().is_update();

        let handle = match prompter.fill(&form, editing).await? {
            FormAction::Quit => return Ok(()),
            FormAction::Submit(values) => {
                wizard.update_settings(|settings| settings.merge(values));
                match wizard.next_target() {
                    Some(step) => wizard.advance(step, StepCallbacks::new())?,
                    None => {
                        println!("{}", external_step_hint(&form.next_button_link));
                        return Ok(());
                    }
                }
            }
            FormAction::Back => match wizard.previous_target() {
                Some(step) => wizard.retreat(step, StepCallbacks::new())?,
                None => {
                    info!("Leaving the wizard");
                    return Ok(());
                }
            },
        };

        let Some(handle) = handle else {
            anyhow::bail!("No source type selected");
        };
        outcome = handle.await?;
    }
}

/// Instructions printed when a step continues outside the wizard
///
/// The server issues a fresh recall id for the external flow and embeds it in
/// the link, so the hint never repeats the token this session started with.
fn external_step_hint(link: &str) -> String {
    format!(
        "Continue at: {}\n\
        The link carries the recall id of this flow. Once done, run srcwiz again \
        with SRCWIZ_RECALL set to that id.",
        link
    )
}
