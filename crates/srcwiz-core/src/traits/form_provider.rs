// # Form Provider Trait
//
// Defines the interface for fetching one step of the source settings flow.
//
// ## Implementations
//
// - HTTP: `srcwiz-provider-http` crate
// - In-process scripted provider: `demos/embedded_usage.rs`
//
// ## Usage
//
// ```rust,ignore
// use srcwiz_core::traits::{FormProvider, StepOutcome, TransitionRequest};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* FormProvider implementation */;
//
//     let request = TransitionRequest::new("abstract.OVHAPI", 0, WizardSettings::new(), None);
//     match provider.fetch_step(&request).await? {
//         StepOutcome::Form { form, .. } => println!("{} field(s)", form.fields.len()),
//         StepOutcome::Created { source, .. } => println!("created {:?}", source.id),
//         StepOutcome::Empty { .. } => {}
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::form::{CustomForm, SourceRecord};
use crate::settings::WizardSettings;
use crate::state::StepIndex;

/// Parameters of a single step query
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    /// Identifier of the selected source type
    pub provider_type: String,

    /// Step being requested
    pub step: StepIndex,

    /// Settings accumulated so far
    pub settings: WizardSettings,

    /// Opaque token resuming an interrupted flow
    pub recall_token: Option<String>,
}

impl TransitionRequest {
    pub fn new(
        provider_type: impl Into<String>,
        step: StepIndex,
        settings: WizardSettings,
        recall_token: Option<String>,
    ) -> Self {
        Self {
            provider_type: provider_type.into(),
            step,
            settings,
            recall_token,
        }
    }
}

/// Successful answer of the form provider
///
/// Failures travel on the `Err` side of [`FormProvider::fetch_step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// More input is needed: render this form for the requested step
    Form {
        form: CustomForm,
        redirect: Option<String>,
    },

    /// The source was created or updated
    Created {
        source: SourceRecord,
        redirect: Option<String>,
    },

    /// The server answered with neither a form nor a source
    Empty {
        redirect: Option<String>,
    },
}

impl StepOutcome {
    /// Short name used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            StepOutcome::Form { .. } => "form",
            StepOutcome::Created { .. } => "created",
            StepOutcome::Empty { .. } => "empty",
        }
    }
}

/// Trait for form provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// A provider performs exactly one exchange with the server per call and
/// decodes the answer into a [`StepOutcome`] or an error. It does not:
/// - retry or apply timeouts beyond its transport's own (owned by `SourceWizard`)
/// - touch wizard state, busy flags or sinks (owned by `SourceWizard`)
/// - validate field contents (owned by the server)
#[async_trait]
pub trait FormProvider: Send + Sync {
    /// Fetch the representation of `request.step`
    ///
    /// # Returns
    ///
    /// - `Ok(StepOutcome)`: The decoded answer
    /// - `Err(Error)`: Transport failure or server-side rejection; rejections
    ///   carry the server's payload as [`crate::Error::Server`]
    async fn fetch_step(&self, request: &TransitionRequest) -> Result<StepOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
