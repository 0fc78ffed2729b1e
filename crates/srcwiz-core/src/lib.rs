// # srcwiz-core
//
// Core library for the server-driven source configuration wizard.
//
// ## Architecture Overview
//
// A DNS "source" is configured through a sequence of forms that the server
// describes one step at a time. This library owns the client-side controller
// for that sequence:
// - **FormProvider**: Trait for fetching the representation of a step
// - **Notifier**: Trait for surfacing user-visible notifications
// - **Navigator**: Trait for reading the current path and navigating away
// - **SourceWizard**: Controller that drives step transitions and dispatches outcomes
// - **WizardSettings / WizardState**: Accumulated payload and transient control state
//
// ## Design Principles
//
// 1. **Server-Driven**: Step numbering, fields and validation belong to the server
// 2. **Injected Capabilities**: No ambient UI state, every sink is passed in
// 3. **Library-First**: The CLI is a thin layer over this crate
// 4. **Liveness**: Busy flags are cleared on every outcome, including timeouts

pub mod traits;
pub mod engine;
pub mod form;
pub mod settings;
pub mod state;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{FormProvider, Navigator, Notification, Notifier, Severity, StepOutcome, TransitionRequest};
pub use engine::{SourceWizard, StepCallbacks, TransitionOutcome, WizardEvent};
pub use form::{CustomForm, SourceField, SourceRecord};
pub use settings::WizardSettings;
pub use state::{StepIndex, WizardState};
pub use config::{HttpProviderConfig, WizardConfig};
pub use error::{Error, ErrorPayload, Result};
