//! Minimal embedding example for srcwiz-core
//!
//! This example drives the wizard against an in-process form provider.
//! Notifications and navigation are plain closures over stdout, and the
//! application decides when to advance.

use serde_json::json;
use srcwiz_core::traits::{
    FormProvider, Navigator, Notification, Notifier, StepOutcome, TransitionRequest,
};
use srcwiz_core::{
    CustomForm, Result, SourceField, SourceRecord, SourceWizard, StepCallbacks, WizardConfig,
};
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Two-step flow: ask for an application key, then save the source
struct EmbeddedFormProvider;

#[async_trait::async_trait]
impl FormProvider for EmbeddedFormProvider {
    async fn fetch_step(&self, request: &TransitionRequest) -> Result<StepOutcome> {
        println!(
            "[Embedded] {} step {} with {}",
            request.provider_type,
            request.step,
            serde_json::to_string(&request.settings.resource)?
        );

        match request.step {
            0 => Ok(StepOutcome::Form {
                form: CustomForm {
                    before_text: "Enter your application key".to_string(),
                    fields: vec![SourceField {
                        id: "appkey".to_string(),
                        field_type: "string".to_string(),
                        label: Some("Application key".to_string()),
                        required: true,
                        ..Default::default()
                    }],
                    next_button_text: "Save".to_string(),
                    next_button_state: 1,
                    previous_button_state: -1,
                    ..Default::default()
                },
                redirect: None,
            }),
            _ => Ok(StepOutcome::Created {
                source: SourceRecord {
                    id: json!(7),
                    source_type: request.provider_type.clone(),
                    comment: request.settings.comment.clone(),
                    extra: request.settings.resource.clone(),
                },
                redirect: None,
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "embedded"
    }
}

struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notification: Notification) {
        println!(
            "[Toast/{}] {}: {}",
            notification.severity.as_str(),
            notification.title,
            notification.message
        );
    }
}

struct StdoutNavigator {
    path: Mutex<String>,
}

impl Navigator for StdoutNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn navigate_to(&self, path: &str) {
        println!("[Router] -> {}", path);
        *self.path.lock().unwrap() = path.to_string();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== Embedded srcwiz-core Example ===\n");

    let navigator = Arc::new(StdoutNavigator {
        path: Mutex::new("/sources/new/abstract.OVHAPI".to_string()),
    });

    println!("1. Creating wizard...");
    let (wizard, events) = SourceWizard::new(
        Box::new(EmbeddedFormProvider),
        Arc::new(StdoutNotifier),
        navigator,
        WizardConfig::new(),
    )?;

    let event_listener = tokio::spawn(async move {
        let mut events = ReceiverStream::new(events);
        while let Some(event) = events.next().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Mounting for abstract.OVHAPI...");
    wizard.select_provider_type("abstract.OVHAPI");
    if let Some(mount) = wizard.mount(None) {
        println!("   mount -> {:?}", mount.await);
    }

    println!("3. Filling the form and saving...");
    wizard.update_settings(|settings| {
        settings.comment = "Office".to_string();
        settings.set_field("appkey", json!("ak-demo"));
    });

    let callbacks = StepCallbacks::new().on_success(|step, source| {
        println!("   on_success(step {}, {:?})", step, source.map(|s| s.id_string()))
    });
    if let Some(step) = wizard.next_target()
        && let Some(save) = wizard.advance(step, callbacks)?
    {
        println!("   advance -> {:?}", save.await);
    }

    drop(wizard);
    let _ = tokio::time::timeout(std::time::Duration::from_millis(100), event_listener).await;

    println!("\n=== Embedding Successful ===");
    Ok(())
}
