//! Test doubles and common utilities for wizard contract tests
//!
//! This module provides minimal test doubles for the wizard's capabilities:
//! a scripted form provider, a recording notifier and a recording navigator.

#![allow(dead_code)]

use srcwiz_core::error::{Error, Result};
use srcwiz_core::traits::{
    FormProvider, Navigator, Notification, Notifier, StepOutcome, TransitionRequest,
};
use srcwiz_core::{CustomForm, SourceField, SourceRecord, SourceWizard, WizardConfig, WizardEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// One scripted answer
struct ScriptedAnswer {
    result: Result<StepOutcome>,
    /// When set, the answer is held back until the gate fires
    gate: Option<oneshot::Receiver<()>>,
}

/// A FormProvider that replays queued answers and records every request
pub struct ScriptedFormProvider {
    answers: Arc<Mutex<VecDeque<ScriptedAnswer>>>,
    requests: Arc<Mutex<Vec<TransitionRequest>>>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl ScriptedFormProvider {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new provider sharing its script and recordings with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            answers: Arc::clone(&other.answers),
            requests: Arc::clone(&other.requests),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
        }
    }

    /// Queue an answer returned immediately
    pub fn push(&self, result: Result<StepOutcome>) {
        self.answers.lock().unwrap().push_back(ScriptedAnswer { result, gate: None });
    }

    /// Queue an answer returned once the returned sender fires
    pub fn push_gated(&self, result: Result<StepOutcome>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.answers.lock().unwrap().push_back(ScriptedAnswer {
            result,
            gate: Some(rx),
        });
        tx
    }

    /// Get the number of times fetch_step() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Get the recorded requests
    pub fn requests(&self) -> Vec<TransitionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FormProvider for ScriptedFormProvider {
    async fn fetch_step(&self, request: &TransitionRequest) -> Result<StepOutcome> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let answer = self.answers.lock().unwrap().pop_front();
        let Some(answer) = answer else {
            return Err(Error::Other("No scripted answer left".to_string()));
        };

        if let Some(gate) = answer.gate {
            let _ = gate.await;
        }
        answer.result
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// A FormProvider that never answers (for timeout testing)
pub struct SilentFormProvider;

#[async_trait::async_trait]
impl FormProvider for SilentFormProvider {
    async fn fetch_step(&self, _request: &TransitionRequest) -> Result<StepOutcome> {
        std::future::pending().await
    }

    fn provider_name(&self) -> &'static str {
        "silent"
    }
}

/// A Notifier that records every notification
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// A Navigator sitting on a fixed path that records navigation requests
pub struct RecordingNavigator {
    current: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(path.to_string()),
            visited: Mutex::new(Vec::new()),
        })
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    fn navigate_to(&self, path: &str) {
        *self.current.lock().unwrap() = path.to_string();
        self.visited.lock().unwrap().push(path.to_string());
    }
}

/// Path the wizard is mounted on in tests
pub const WIZARD_PATH: &str = "/sources/new/abstract.OVHAPI";

/// Source type selected in tests
pub const SOURCE_TYPE: &str = "abstract.OVHAPI";

/// A wizard wired to test doubles
pub struct Harness {
    pub wizard: SourceWizard,
    pub events: mpsc::Receiver<WizardEvent>,
    pub provider: ScriptedFormProvider,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Build a wizard with the source type already selected
    pub fn new() -> Self {
        Self::with_config(WizardConfig::default())
    }

    pub fn with_config(config: WizardConfig) -> Self {
        let provider = ScriptedFormProvider::new();
        let notifier = RecordingNotifier::new();
        let navigator = RecordingNavigator::at(WIZARD_PATH);

        let (wizard, events) = SourceWizard::new(
            Box::new(ScriptedFormProvider::sharing_counters_with(&provider)),
            notifier.clone(),
            navigator.clone(),
            config,
        )
        .expect("wizard construction succeeds");
        wizard.select_provider_type(SOURCE_TYPE);

        Self {
            wizard,
            events,
            provider,
            notifier,
            navigator,
        }
    }

    /// Drain the events emitted so far
    pub fn drain_events(&mut self) -> Vec<WizardEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// A form with the given field ids that submits to `next` and goes back to `previous`
pub fn form(fields: &[&str], next: i32, previous: i32) -> CustomForm {
    CustomForm {
        fields: fields
            .iter()
            .map(|id| SourceField {
                id: id.to_string(),
                field_type: "string".to_string(),
                ..Default::default()
            })
            .collect(),
        next_button_text: "Next".to_string(),
        next_button_state: next,
        previous_button_text: "Previous".to_string(),
        previous_button_state: previous,
        ..Default::default()
    }
}

pub fn form_answer(form: CustomForm, redirect: Option<&str>) -> Result<StepOutcome> {
    Ok(StepOutcome::Form {
        form,
        redirect: redirect.map(str::to_string),
    })
}

pub fn created_answer(id: serde_json::Value, comment: &str, redirect: Option<&str>) -> Result<StepOutcome> {
    Ok(StepOutcome::Created {
        source: SourceRecord {
            id,
            source_type: SOURCE_TYPE.to_string(),
            comment: comment.to_string(),
            extra: serde_json::Map::new(),
        },
        redirect: redirect.map(str::to_string),
    })
}

pub fn failure_answer(errmsg: &str) -> Result<StepOutcome> {
    Err(Error::server(errmsg))
}

/// Records success callback invocations
#[derive(Clone, Default)]
pub struct CallbackSpy {
    successes: Arc<Mutex<Vec<(i32, Option<SourceRecord>)>>>,
    failures: Arc<Mutex<Vec<srcwiz_core::ErrorPayload>>>,
}

impl CallbackSpy {
    pub fn callbacks(&self) -> srcwiz_core::StepCallbacks {
        let successes = Arc::clone(&self.successes);
        let failures = Arc::clone(&self.failures);
        srcwiz_core::StepCallbacks::new()
            .on_success(move |step, source| {
                successes.lock().unwrap().push((step, source.cloned()));
            })
            .on_failure(move |payload| {
                failures.lock().unwrap().push(payload.clone());
            })
    }

    pub fn successes(&self) -> Vec<(i32, Option<SourceRecord>)> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<srcwiz_core::ErrorPayload> {
        self.failures.lock().unwrap().clone()
    }
}
