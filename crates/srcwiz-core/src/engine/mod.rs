//! Source wizard controller
//!
//! The SourceWizard is responsible for:
//! - Asking the FormProvider for the representation of a step
//! - Classifying the answer (more input needed / source saved / nothing)
//! - Updating the wizard state accordingly
//! - Dispatching notifications, redirects and caller callbacks
//!
//! ## Architecture
//!
//! ```text
//!  advance() / retreat() / mount()
//!               │
//!               ▼
//!      ┌──────────────────┐   TransitionRequest   ┌──────────────┐
//!      │   SourceWizard   │──────────────────────▶│ FormProvider │
//!      │  (WizardState)   │◀──────────────────────│              │
//!      └──────────────────┘  StepOutcome / Error  └──────────────┘
//!               │
//!     ┌─────────┼─────────────┬──────────────┐
//!     ▼         ▼             ▼              ▼
//! ┌────────┐ ┌──────────┐ ┌───────────┐ ┌─────────┐
//! │Notifier│ │Navigator │ │ callbacks │ │ Events  │
//! └────────┘ └──────────┘ └───────────┘ └─────────┘
//! ```
//!
//! ## Transition Flow
//!
//! 1. Caller requests a step; the matching busy flag is raised
//! 2. A sequence number is taken and the request is sent to the FormProvider
//! 3. The answer arrives (or the timeout fires)
//! 4. Answers to superseded requests are discarded
//! 5. Both busy flags are cleared, then exactly one outcome branch runs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, error};

use crate::config::WizardConfig;
use crate::error::{Error, ErrorPayload, Result};
use crate::form::SourceRecord;
use crate::settings::{RESOURCE_ID_KEY, WizardSettings};
use crate::state::{StepIndex, WizardState};
use crate::traits::{
    FormProvider, Navigator, Notification, Notifier, Severity, StepOutcome, TransitionRequest,
};

/// Title of the notification shown when a step is rejected
pub const FAILURE_TITLE: &str = "Something went wrong during source configuration validation";

/// Message of the notification shown when a source is saved
pub const SUCCESS_MESSAGE: &str = "Done";

/// Events emitted by the SourceWizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// A step was requested from the form provider
    StepRequested {
        step: StepIndex,
        sequence: u64,
    },

    /// A form was received and is now current
    FormLoaded {
        step: StepIndex,
        fields: usize,
    },

    /// The source was created or updated
    SourceSaved {
        step: StepIndex,
        source_id: Option<String>,
        updated: bool,
    },

    /// The wizard navigated away
    Redirected {
        path: String,
    },

    /// The server answered with neither a form nor a source
    EmptyResponse {
        step: StepIndex,
    },

    /// The step was rejected or the provider failed
    TransitionFailed {
        step: StepIndex,
        message: String,
    },

    /// An answer arrived after a newer request had been issued
    StaleResponseDiscarded {
        step: StepIndex,
        sequence: u64,
    },
}

/// What a transition ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// No provider type selected; nothing was requested
    Skipped,

    /// A new form is current
    Form,

    /// The source was created or updated
    Created(SourceRecord),

    /// Neither form nor source; state untouched
    Empty,

    /// The step failed; busy flags cleared and the failure notified
    Failed(ErrorPayload),

    /// A newer request superseded this one; the answer was ignored
    Stale,
}

/// Callback invoked with the reached step and, on save, the stored source
pub type SuccessCallback = Box<dyn FnOnce(StepIndex, Option<&SourceRecord>) + Send>;

/// Callback invoked with the raw failure payload
pub type FailureCallback = Box<dyn FnOnce(&ErrorPayload) + Send>;

/// Optional caller hooks for one transition
#[derive(Default)]
pub struct StepCallbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl StepCallbacks {
    /// No callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `f` when the step is reached and no redirect applies
    pub fn on_success(
        mut self,
        f: impl FnOnce(StepIndex, Option<&SourceRecord>) + Send + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Invoke `f` with the server payload when the step fails
    pub fn on_failure(mut self, f: impl FnOnce(&ErrorPayload) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for StepCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Which busy flag a transition raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Mount-time or caller-driven load, no flag
    Load,
    Forward,
    Backward,
}

/// Mutable part of the wizard, guarded by one mutex
struct Inner {
    state: WizardState,
    provider_type: Option<String>,
    /// Sequence number of the latest request issued
    latest_sequence: u64,
}

struct Shared {
    provider: Box<dyn FormProvider>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: WizardConfig,
    inner: Mutex<Inner>,
    event_tx: mpsc::Sender<WizardEvent>,
}

/// Multi-step source configuration wizard
///
/// One instance configures one source at a time. Cloning is cheap and every
/// clone drives the same wizard.
///
/// ## Lifecycle
///
/// 1. Create with [`SourceWizard::new()`]
/// 2. Select a source type with [`SourceWizard::select_provider_type()`]
/// 3. Load the first form with [`SourceWizard::mount()`]
/// 4. Merge user input with [`SourceWizard::update_settings()`], then
///    [`SourceWizard::advance()`] or [`SourceWizard::retreat()`]
///
/// ## Threading
///
/// Transitions run as tokio tasks. The state lock is never held across the
/// provider call nor while calling a sink or callback.
///
/// ## Ordering
///
/// Every request takes a sequence number. An answer whose number is not the
/// latest issued is discarded without touching state or sinks.
#[derive(Clone)]
pub struct SourceWizard {
    shared: Arc<Shared>,
}

impl SourceWizard {
    /// Create a new source wizard
    ///
    /// # Parameters
    ///
    /// - `provider`: Form provider implementation
    /// - `notifier`: Notification sink
    /// - `navigator`: Navigation sink
    /// - `config`: Wizard configuration
    ///
    /// # Returns
    ///
    /// A tuple of (wizard, event_receiver) where event_receiver yields wizard events
    pub fn new(
        provider: Box<dyn FormProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: WizardConfig,
    ) -> Result<(Self, mpsc::Receiver<WizardEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let wizard = Self {
            shared: Arc::new(Shared {
                provider,
                notifier,
                navigator,
                config,
                inner: Mutex::new(Inner {
                    state: WizardState::new(),
                    provider_type: None,
                    latest_sequence: 0,
                }),
                event_tx: tx,
            }),
        };

        Ok((wizard, rx))
    }

    /// Select the source type to configure
    pub fn select_provider_type(&self, provider_type: impl Into<String>) {
        let provider_type = provider_type.into();
        debug!("Selected source type: {}", provider_type);
        self.lock().provider_type = Some(provider_type);
    }

    /// Currently selected source type
    pub fn provider_type(&self) -> Option<String> {
        self.lock().provider_type.clone()
    }

    /// Snapshot of the wizard state
    pub fn state(&self) -> WizardState {
        self.lock().state.clone()
    }

    /// Snapshot of the accumulated settings
    pub fn settings(&self) -> WizardSettings {
        self.lock().state.settings.clone()
    }

    /// Mutate the accumulated settings (merging user input before a step)
    ///
    /// `f` runs on a copy with the state lock released, so it may call back
    /// into the wizard. The copy replaces the settings once `f` returns.
    pub fn update_settings<R>(&self, f: impl FnOnce(&mut WizardSettings) -> R) -> R {
        let mut settings = self.settings();
        let result = f(&mut settings);
        self.lock().state.settings = settings;
        result
    }

    /// Set the display name of the source being configured
    pub fn set_comment(&self, comment: impl Into<String>) {
        self.lock().state.settings.comment = comment.into();
    }

    /// Reset the accumulated settings, leaving step and form untouched
    pub fn reset(&self) {
        self.lock().state.reset();
    }

    /// Whether the current step cannot be rendered yet
    pub fn is_loading(&self) -> bool {
        let inner = self.lock();
        inner.state.current_form.is_none() || inner.provider_type.is_none()
    }

    /// Whether either busy flag is set
    pub fn is_busy(&self) -> bool {
        self.lock().state.is_busy()
    }

    /// Step the current form submits to, if it submits to a step
    pub fn next_target(&self) -> Option<StepIndex> {
        self.lock().state.current_form.as_ref()?.next_target()
    }

    /// Step the current form goes back to, `None` when "previous" leaves the wizard
    pub fn previous_target(&self) -> Option<StepIndex> {
        self.lock().state.current_form.as_ref()?.previous_target()
    }

    /// Activate the wizard for a new source
    ///
    /// Resets the settings, then loads the current step when a source type is
    /// selected and the step is non-negative. This is the only place the
    /// recall token is consulted.
    pub fn mount(&self, recall_token: Option<String>) -> Option<JoinHandle<TransitionOutcome>> {
        self.mount_with(recall_token, |_| {})
    }

    /// Activate the wizard for an existing source
    ///
    /// Same as [`SourceWizard::mount()`], with the source identifier seeded
    /// into the settings so that saving reports an update.
    pub fn mount_existing(
        &self,
        source_id: serde_json::Value,
        recall_token: Option<String>,
    ) -> Option<JoinHandle<TransitionOutcome>> {
        self.mount_with(recall_token, |settings| {
            settings.set_field(RESOURCE_ID_KEY, source_id)
        })
    }

    fn mount_with(
        &self,
        recall_token: Option<String>,
        seed: impl FnOnce(&mut WizardSettings),
    ) -> Option<JoinHandle<TransitionOutcome>> {
        let step = {
            let mut inner = self.lock();
            inner.state.reset();
            seed(&mut inner.state.settings);

            if inner.provider_type.is_none() || inner.state.current_step < 0 {
                debug!("Wizard mounted without a loadable step");
                return None;
            }
            inner.state.current_step
        };

        self.request_step(step, recall_token, StepCallbacks::new())
    }

    /// Request a step in the background
    ///
    /// Fire-and-forget form of [`SourceWizard::load_step()`]. Must be called
    /// from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// - `Some(JoinHandle)`: The spawned transition
    /// - `None`: No source type is selected, nothing was requested
    pub fn request_step(
        &self,
        target_step: StepIndex,
        recall_token: Option<String>,
        callbacks: StepCallbacks,
    ) -> Option<JoinHandle<TransitionOutcome>> {
        self.spawn(target_step, recall_token, callbacks, Direction::Load)
            .ok()
            .flatten()
    }

    /// Move forward to `target_step`, raising the `advancing` flag
    ///
    /// # Returns
    ///
    /// - `Ok(Some(JoinHandle))`: The spawned transition
    /// - `Ok(None)`: No source type is selected
    /// - `Err(Error::Busy)`: A transition is already in flight
    pub fn advance(
        &self,
        target_step: StepIndex,
        callbacks: StepCallbacks,
    ) -> Result<Option<JoinHandle<TransitionOutcome>>> {
        self.spawn(target_step, None, callbacks, Direction::Forward)
    }

    /// Move back to `target_step`, raising the `retreating` flag
    ///
    /// Same contract as [`SourceWizard::advance()`].
    pub fn retreat(
        &self,
        target_step: StepIndex,
        callbacks: StepCallbacks,
    ) -> Result<Option<JoinHandle<TransitionOutcome>>> {
        self.spawn(target_step, None, callbacks, Direction::Backward)
    }

    /// Request a step and wait for its outcome
    ///
    /// Failures are handled here (flags cleared, notification, callback) and
    /// reported as [`TransitionOutcome::Failed`], never as an error.
    pub async fn load_step(
        &self,
        target_step: StepIndex,
        recall_token: Option<String>,
        callbacks: StepCallbacks,
    ) -> TransitionOutcome {
        match self.begin(target_step, recall_token, Direction::Load) {
            Ok(Some((request, sequence))) => self.run(request, sequence, callbacks).await,
            _ => TransitionOutcome::Skipped,
        }
    }

    fn spawn(
        &self,
        target_step: StepIndex,
        recall_token: Option<String>,
        callbacks: StepCallbacks,
        direction: Direction,
    ) -> Result<Option<JoinHandle<TransitionOutcome>>> {
        let Some((request, sequence)) = self.begin(target_step, recall_token, direction)? else {
            return Ok(None);
        };

        let wizard = self.clone();
        Ok(Some(tokio::spawn(async move {
            wizard.run(request, sequence, callbacks).await
        })))
    }

    /// Raise the busy flag and build the request under one lock
    fn begin(
        &self,
        target_step: StepIndex,
        recall_token: Option<String>,
        direction: Direction,
    ) -> Result<Option<(TransitionRequest, u64)>> {
        let mut inner = self.lock();

        let Some(provider_type) = inner.provider_type.clone() else {
            debug!("No source type selected, step {} not requested", target_step);
            return Ok(None);
        };

        match direction {
            Direction::Load => {}
            Direction::Forward | Direction::Backward if inner.state.is_busy() => {
                return Err(Error::Busy);
            }
            Direction::Forward => inner.state.advancing = true,
            Direction::Backward => inner.state.retreating = true,
        }

        inner.latest_sequence += 1;
        let sequence = inner.latest_sequence;

        let request = TransitionRequest::new(
            provider_type,
            target_step,
            inner.state.settings.clone(),
            recall_token,
        );

        Ok(Some((request, sequence)))
    }

    async fn run(
        &self,
        request: TransitionRequest,
        sequence: u64,
        callbacks: StepCallbacks,
    ) -> TransitionOutcome {
        let target_step = request.step;
        info!(
            "Requesting step {} of {} from {}",
            target_step,
            request.provider_type,
            self.shared.provider.provider_name()
        );
        self.emit_event(WizardEvent::StepRequested {
            step: target_step,
            sequence,
        });

        let timeout = self.shared.config.request_timeout();
        let fetch = self.shared.provider.fetch_step(&request);
        let result = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout)),
        };

        self.complete(target_step, sequence, result, callbacks)
    }

    /// Apply an answer to the state and dispatch its outcome
    fn complete(
        &self,
        target_step: StepIndex,
        sequence: u64,
        result: Result<StepOutcome>,
        callbacks: StepCallbacks,
    ) -> TransitionOutcome {
        let mut inner = self.lock();

        if inner.latest_sequence != sequence {
            drop(inner);
            warn!(
                "Discarding answer for step {} (request #{} superseded)",
                target_step, sequence
            );
            self.emit_event(WizardEvent::StaleResponseDiscarded {
                step: target_step,
                sequence,
            });
            return TransitionOutcome::Stale;
        }

        inner.state.clear_busy();

        match result {
            Ok(StepOutcome::Form { form, redirect }) => {
                let fields = form.fields.len();
                inner.state.current_form = Some(form);
                inner.state.current_step = target_step;
                drop(inner);

                debug!("Step {} loaded with {} field(s)", target_step, fields);
                self.emit_event(WizardEvent::FormLoaded {
                    step: target_step,
                    fields,
                });

                if !self.follow_redirect(redirect.as_deref())
                    && let Some(on_success) = callbacks.on_success
                {
                    on_success(target_step, None);
                }
                TransitionOutcome::Form
            }

            Ok(StepOutcome::Created { source, redirect }) => {
                let updated = inner.state.settings.is_update();
                inner.state.current_step = target_step;
                drop(inner);

                self.announce_saved(&source, updated);
                self.emit_event(WizardEvent::SourceSaved {
                    step: target_step,
                    source_id: source.id_string(),
                    updated,
                });

                if !self.follow_redirect(redirect.as_deref()) {
                    if let Some(on_success) = callbacks.on_success {
                        on_success(target_step, Some(&source));
                    } else {
                        self.open_source(&source);
                    }
                }
                TransitionOutcome::Created(source)
            }

            Ok(StepOutcome::Empty { .. }) => {
                drop(inner);
                debug!("Step {} answered with neither form nor source", target_step);
                self.emit_event(WizardEvent::EmptyResponse { step: target_step });
                TransitionOutcome::Empty
            }

            Err(err) => {
                drop(inner);
                let payload = err.payload();
                error!("Step {} failed: {}", target_step, err);

                self.shared.notifier.notify(Notification {
                    title: FAILURE_TITLE.to_string(),
                    message: payload.errmsg.clone(),
                    severity: Severity::Danger,
                    duration: self.shared.config.notification_duration(),
                });
                self.emit_event(WizardEvent::TransitionFailed {
                    step: target_step,
                    message: payload.errmsg.clone(),
                });

                if let Some(on_failure) = callbacks.on_failure {
                    on_failure(&payload);
                }
                TransitionOutcome::Failed(payload)
            }
        }
    }

    /// Navigate to `redirect` unless it is absent or already the current path
    ///
    /// Returns whether navigation happened.
    fn follow_redirect(&self, redirect: Option<&str>) -> bool {
        let Some(path) = redirect.filter(|path| !path.is_empty()) else {
            return false;
        };

        if self.shared.navigator.current_path() == path {
            debug!("Already on {}, redirect not followed", path);
            return false;
        }

        self.navigate(path);
        true
    }

    /// Fall back to the detail view of a saved source
    fn open_source(&self, source: &SourceRecord) {
        match source.id_string() {
            Some(id) => {
                let path = self.shared.config.detail_path(&id);
                self.navigate(&path);
            }
            None => warn!("Saved source carries no identifier, staying on the current page"),
        }
    }

    fn navigate(&self, path: &str) {
        info!("Navigating to {}", path);
        self.shared.navigator.navigate_to(path);
        self.emit_event(WizardEvent::Redirected {
            path: path.to_string(),
        });
    }

    fn announce_saved(&self, source: &SourceRecord, updated: bool) {
        let title = saved_title(
            source
                .display_comment()
                .unwrap_or(&self.shared.config.default_source_label),
            updated,
        );
        info!("{}", title);

        self.shared.notifier.notify(Notification {
            title,
            message: SUCCESS_MESSAGE.to_string(),
            severity: Severity::Success,
            duration: self.shared.config.notification_duration(),
        });
    }

    /// Emit a wizard event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: WizardEvent) {
        // Dropped when the receiver lags; the wizard never waits on observers
        if self.shared.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Title of the notification shown when a source is saved
pub fn saved_title(label: &str, updated: bool) -> String {
    format!(
        "{} has been {}.",
        label,
        if updated { "updated" } else { "added" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_title_wording() {
        assert_eq!(saved_title("My Source", true), "My Source has been updated.");
        assert_eq!(
            saved_title("Your new source", false),
            "Your new source has been added."
        );
    }

    #[test]
    fn callbacks_debug_shows_presence_only() {
        let callbacks = StepCallbacks::new().on_failure(|_| {});
        let debug_str = format!("{:?}", callbacks);
        assert!(debug_str.contains("on_success: false"));
        assert!(debug_str.contains("on_failure: true"));
    }

    #[test]
    fn wizard_event_clone_eq() {
        let event = WizardEvent::StepRequested { step: 1, sequence: 7 };
        assert_eq!(event.clone(), event);
    }

    struct EmptyProvider;

    #[async_trait::async_trait]
    impl FormProvider for EmptyProvider {
        async fn fetch_step(&self, _request: &TransitionRequest) -> Result<StepOutcome> {
            Ok(StepOutcome::Empty { redirect: None })
        }

        fn provider_name(&self) -> &'static str {
            "empty"
        }
    }

    struct Quiet;

    impl Notifier for Quiet {
        fn notify(&self, _notification: Notification) {}
    }

    impl Navigator for Quiet {
        fn current_path(&self) -> String {
            "/sources/new".to_string()
        }

        fn navigate_to(&self, _path: &str) {}
    }

    fn quiet_wizard() -> (SourceWizard, mpsc::Receiver<WizardEvent>) {
        tokio_test::assert_ok!(SourceWizard::new(
            Box::new(EmptyProvider),
            Arc::new(Quiet),
            Arc::new(Quiet),
            WizardConfig::new(),
        ))
    }

    #[test]
    fn load_without_source_type_is_skipped() {
        let (wizard, _events) = quiet_wizard();
        let outcome = tokio_test::block_on(wizard.load_step(0, None, StepCallbacks::new()));

        assert_eq!(outcome, TransitionOutcome::Skipped);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn empty_answer_leaves_state_untouched() {
        let (wizard, mut events) = quiet_wizard();
        wizard.select_provider_type("abstract.OVHAPI");

        let outcome = tokio_test::block_on(wizard.load_step(4, None, StepCallbacks::new()));

        assert_eq!(outcome, TransitionOutcome::Empty);
        assert_eq!(wizard.state().current_step, 0);
        assert!(wizard.state().current_form.is_none());
        assert!(matches!(
            events.try_recv(),
            Ok(WizardEvent::StepRequested { step: 4, .. })
        ));
        assert_eq!(events.try_recv(), Ok(WizardEvent::EmptyResponse { step: 4 }));
    }

    #[test]
    fn update_settings_closure_may_call_back_into_wizard() {
        let (wizard, _events) = quiet_wizard();
        wizard.select_provider_type("abstract.OVHAPI");

        let seen = wizard.update_settings(|settings| {
            settings.set_field("appkey", serde_json::json!("ak-1"));
            settings.comment = "Office".to_string();
            (wizard.is_busy(), wizard.provider_type(), wizard.settings().comment)
        });

        assert_eq!(seen, (false, Some("abstract.OVHAPI".to_string()), String::new()));
        let settings = wizard.settings();
        assert_eq!(settings.resource.get("appkey"), Some(&serde_json::json!("ak-1")));
        assert_eq!(settings.comment, "Office");
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = WizardConfig::new();
        config.event_channel_capacity = 0;

        let result = SourceWizard::new(
            Box::new(EmptyProvider),
            Arc::new(Quiet),
            Arc::new(Quiet),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
