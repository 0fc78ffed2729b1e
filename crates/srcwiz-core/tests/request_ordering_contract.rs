//! Contract Test: Request Ordering
//!
//! This test verifies the wizard's behavior under overlapping transitions.
//!
//! Constraints verified:
//! - `advance()` / `retreat()` refuse to start while a transition is in flight
//! - An answer to a superseded request is discarded: no state change, no sink call
//! - The latest request alone decides the state and clears the busy flags
//!
//! If this test fails, a slow answer can overwrite the step the user is on.

mod common;

use common::*;
use srcwiz_core::{Error, StepCallbacks, TransitionOutcome, WizardEvent};

#[tokio::test]
async fn advance_is_refused_while_busy() {
    let harness = Harness::new();
    let release = harness.provider.push_gated(form_answer(form(&["a"], 2, 0), None));

    let first = harness.wizard.advance(1, StepCallbacks::new()).unwrap().unwrap();

    assert!(matches!(
        harness.wizard.advance(2, StepCallbacks::new()),
        Err(Error::Busy)
    ));
    assert!(matches!(
        harness.wizard.retreat(0, StepCallbacks::new()),
        Err(Error::Busy)
    ));

    release.send(()).unwrap();
    assert_eq!(first.await.unwrap(), TransitionOutcome::Form);
    assert!(!harness.wizard.is_busy());
}

#[tokio::test]
async fn superseded_answer_is_discarded() {
    let mut harness = Harness::new();
    let slow = harness
        .provider
        .push_gated(failure_answer("Stale failure must not surface"));
    harness.provider.push(form_answer(form(&["latest"], 3, 1), None));

    let spy = CallbackSpy::default();
    let first = harness.wizard.request_step(1, None, spy.callbacks()).unwrap();
    tokio::task::yield_now().await;

    let second = harness
        .wizard
        .request_step(2, None, StepCallbacks::new())
        .unwrap();
    assert_eq!(second.await.unwrap(), TransitionOutcome::Form);

    slow.send(()).unwrap();
    assert_eq!(first.await.unwrap(), TransitionOutcome::Stale);

    let state = harness.wizard.state();
    assert_eq!(state.current_step, 2);
    assert_eq!(state.current_form, Some(form(&["latest"], 3, 1)));
    assert!(harness.notifier.notifications().is_empty());
    assert!(spy.failures().is_empty(), "callbacks of a stale request never fire");

    let events = harness.drain_events();
    assert!(events.contains(&WizardEvent::StaleResponseDiscarded { step: 1, sequence: 1 }));
}

#[tokio::test]
async fn latest_request_clears_flags_even_when_first_is_pending() {
    let harness = Harness::new();
    let slow = harness.provider.push_gated(form_answer(form(&["old"], 1, 0), None));
    harness.provider.push(form_answer(form(&["new"], 1, 0), None));

    let first = harness.wizard.advance(1, StepCallbacks::new()).unwrap().unwrap();
    tokio::task::yield_now().await;
    assert!(harness.wizard.is_busy());

    // An explicit reload is not guarded by the busy flags
    harness.wizard.load_step(0, None, StepCallbacks::new()).await;
    assert!(!harness.wizard.is_busy());

    slow.send(()).unwrap();
    assert_eq!(first.await.unwrap(), TransitionOutcome::Stale);
    assert_eq!(harness.wizard.state().current_form, Some(form(&["new"], 1, 0)));
    assert_eq!(harness.wizard.state().current_step, 0);
}
