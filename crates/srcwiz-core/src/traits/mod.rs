//! Capability traits of the source wizard
//!
//! This module defines the abstract interfaces the wizard depends on.
//!
//! - [`FormProvider`]: Fetch the representation of a step from the server
//! - [`Notifier`]: Surface user-visible notifications
//! - [`Navigator`]: Read the current path and navigate away

pub mod form_provider;
pub mod notifier;
pub mod navigator;

pub use form_provider::{FormProvider, StepOutcome, TransitionRequest};
pub use notifier::{Notification, Notifier, Severity};
pub use navigator::Navigator;
