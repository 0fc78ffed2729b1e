// # Wizard State
//
// Transient control state of one wizard instance. Nothing here is persisted;
// a reload resumes through the server-side recall token instead.
//
// ## Invariants
//
// - `advancing` and `retreating` are both false whenever no transition is in flight
// - `settings.resource` survives every step and is only replaced by `reset()`
// - `current_step` and `current_form` are driven by transitions, never by `reset()`

use crate::form::CustomForm;
use crate::settings::WizardSettings;

/// Position in the server-driven step sequence
///
/// Negative values are the "not started / leave the wizard" sentinel.
pub type StepIndex = i32;

/// Snapshot of a wizard's state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    /// Active position in the step sequence
    pub current_step: StepIndex,

    /// Last form received, `None` before the first load
    pub current_form: Option<CustomForm>,

    /// Accumulated settings
    pub settings: WizardSettings,

    /// A forward transition is in flight
    pub advancing: bool,

    /// A backward transition is in flight
    pub retreating: bool,
}

impl WizardState {
    /// Create the state of a freshly constructed wizard
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the accumulated settings, leaving step and form untouched
    pub fn reset(&mut self) {
        self.settings.reset();
    }

    /// Whether either busy flag is set
    pub fn is_busy(&self) -> bool {
        self.advancing || self.retreating
    }

    /// Clear both busy flags
    pub(crate) fn clear_busy(&mut self) {
        self.advancing = false;
        self.retreating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_leaves_step_and_form_untouched() {
        let mut state = WizardState::new();
        state.current_step = 3;
        state.current_form = Some(CustomForm::default());
        state.settings.set_field("foo", serde_json::json!(1));
        state.settings.comment = "label".to_string();
        state.settings.redirect_hint = Some("/somewhere".to_string());

        state.reset();

        assert_eq!(state.current_step, 3);
        assert!(state.current_form.is_some());
        assert!(state.settings.resource.is_empty());
        assert!(state.settings.comment.is_empty());
        assert_eq!(state.settings.redirect_hint, None);
    }

    #[test]
    fn busy_flags_are_independent() {
        let mut state = WizardState::new();
        assert!(!state.is_busy());

        state.retreating = true;
        assert!(state.is_busy());
        assert!(!state.advancing);

        state.clear_busy();
        assert!(!state.is_busy());
    }
}
