//! Terminal implementations of the wizard's sinks, and form prompting

use std::io;
use std::sync::{Arc, Mutex};

use dialoguer::Password;
use dialoguer::theme::ColorfulTheme;
use serde_json::{Map, Value};
use srcwiz_core::traits::{Navigator, Notification, Notifier, Severity};
use srcwiz_core::{CustomForm, SourceField};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Prints notifications to stderr
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.severity {
            Severity::Success => "✓",
            Severity::Danger => "✗",
        };
        eprintln!("{} {}", marker, notification.title);
        if notification.severity == Severity::Danger {
            eprintln!("  {}", notification.message);
        }
    }
}

/// Tracks a virtual location; the wizard ends once it navigates away
pub struct TerminalNavigator {
    current: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(start.into()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .map(|path| path.clone())
            .unwrap_or_default()
    }

    fn navigate_to(&self, path: &str) {
        println!("→ {}", path);
        if let Ok(mut current) = self.current.lock() {
            *current = path.to_string();
        }
    }
}

/// What the user chose to do with a form
#[derive(Debug, PartialEq)]
pub enum FormAction {
    /// Submit the collected values
    Submit(Map<String, Value>),
    /// Go back to the previous step
    Back,
    /// Stop the wizard
    Quit,
}

/// Source of answers for `secret` fields
pub trait SecretReader: Send + Sync {
    /// Read one answer without echoing it
    fn read_secret(&self, prompt: &str) -> io::Result<String>;
}

/// Reads secrets from the terminal with echo disabled
pub struct HiddenTerminalInput;

impl SecretReader for HiddenTerminalInput {
    fn read_secret(&self, prompt: &str) -> io::Result<String> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|dialoguer::Error::IO(e)| e)
    }
}

/// Collects answers line by line; secret fields go through a [`SecretReader`]
pub struct Prompter<R> {
    lines: Lines<R>,
    secrets: Arc<dyn SecretReader>,
}

impl Prompter<BufReader<Stdin>> {
    /// Prompter reading stdin, with hidden input for secrets
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), Arc::new(HiddenTerminalInput))
    }
}

impl<R: AsyncBufRead + Unpin> Prompter<R> {
    pub fn new(input: R, secrets: Arc<dyn SecretReader>) -> Self {
        Self {
            lines: input.lines(),
            secrets,
        }
    }

    /// Render `form` and collect one value per field
    ///
    /// Typing `<` goes back, `q` (or end of input) quits.
    pub async fn fill(&mut self, form: &CustomForm, editing: bool) -> anyhow::Result<FormAction> {
        print_text(&form.before_text);
        print_text(&form.side_text);

        let mut values = Map::new();
        for field in &form.fields {
            loop {
                let Some(line) = self.read_answer(field).await? else {
                    return Ok(FormAction::Quit);
                };
                let answer = line.trim();

                match answer {
                    "<" => return Ok(FormAction::Back),
                    "q" => return Ok(FormAction::Quit),
                    "" => {
                        if let Some(default) = &field.default {
                            values.insert(field.id.clone(), default.clone());
                        } else if field.required {
                            eprintln!("  {} is required", field_label(field));
                            continue;
                        }
                        break;
                    }
                    _ => match parse_value(field, answer) {
                        Some(value) => {
                            values.insert(field.id.clone(), value);
                            break;
                        }
                        None => eprintln!("  Invalid value for {}", field_label(field)),
                    },
                }
            }
        }

        print_text(&form.after_text);
        let previous = form.previous_label(editing);
        println!(
            "[Enter] {}{}",
            form.next_label(editing),
            if previous.is_empty() {
                String::new()
            } else {
                format!("   [<] {}", previous)
            }
        );

        match self.lines.next_line().await?.as_deref().map(str::trim) {
            None | Some("q") => Ok(FormAction::Quit),
            Some("<") => Ok(FormAction::Back),
            Some(_) => Ok(FormAction::Submit(values)),
        }
    }

    /// Prompt for one field; `None` at end of input
    async fn read_answer(&mut self, field: &SourceField) -> anyhow::Result<Option<String>> {
        if let Some(description) = &field.description {
            println!("  {}", description);
        }
        let prompt = field_prompt(field);

        if field.secret {
            let secrets = self.secrets.clone();
            let answer =
                tokio::task::spawn_blocking(move || secrets.read_secret(&prompt)).await??;
            return Ok(Some(answer));
        }

        println!("{}:", prompt);
        Ok(self.lines.next_line().await?)
    }
}

fn print_text(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}

fn field_label(field: &SourceField) -> &str {
    field.label.as_deref().unwrap_or(&field.id)
}

/// Prompt line for a field; secret defaults are never shown
fn field_prompt(field: &SourceField) -> String {
    let mut prompt = field_label(field).to_string();
    if !field.choices.is_empty() {
        prompt.push_str(&format!(" ({})", field.choices.join("/")));
    }
    if let Some(default) = &field.default
        && !field.secret
    {
        prompt.push_str(&format!(" [{}]", render(default)));
    } else if let Some(placeholder) = &field.placeholder {
        prompt.push_str(&format!(" e.g. {}", placeholder));
    }
    if field.required {
        prompt.push('*');
    }
    prompt
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a typed answer according to the field's declared type
fn parse_value(field: &SourceField, answer: &str) -> Option<Value> {
    if !field.choices.is_empty() && !field.choices.iter().any(|c| c == answer) {
        return None;
    }

    match field.field_type.as_str() {
        "bool" => match answer.to_lowercase().as_str() {
            "y" | "yes" | "true" | "1" => Some(Value::Bool(true)),
            "n" | "no" | "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" => answer.parse::<i64>().ok().map(Value::from),
        "float32" | "float64" => answer.parse::<f64>().ok().map(Value::from),
        _ => Some(Value::String(answer.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field_type: &str) -> SourceField {
        SourceField {
            id: "f".to_string(),
            field_type: field_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn answers_follow_field_type() {
        assert_eq!(parse_value(&field("bool"), "yes"), Some(Value::Bool(true)));
        assert_eq!(parse_value(&field("bool"), "maybe"), None);
        assert_eq!(parse_value(&field("uint16"), "53"), Some(Value::from(53)));
        assert_eq!(parse_value(&field("int"), "x"), None);
        assert_eq!(parse_value(&field("string"), "ovh-eu"), Some(Value::from("ovh-eu")));
    }

    #[test]
    fn choices_restrict_answers() {
        let mut endpoint = field("string");
        endpoint.choices = vec!["ovh-eu".to_string(), "ovh-ca".to_string()];

        assert!(parse_value(&endpoint, "ovh-ca").is_some());
        assert!(parse_value(&endpoint, "ovh-us").is_none());
    }

    /// Hands out canned secrets and remembers the prompts it was shown
    struct CannedSecrets {
        answers: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedSecrets {
        fn new(answers: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl SecretReader for CannedSecrets {
        fn read_secret(&self, prompt: &str) -> io::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answers.lock().unwrap().pop().unwrap_or_default())
        }
    }

    fn credentials_form() -> CustomForm {
        let mut endpoint = field("string");
        endpoint.id = "endpoint".to_string();
        let mut secret = field("string");
        secret.id = "appsecret".to_string();
        secret.label = Some("Application secret".to_string());
        secret.secret = true;
        secret.required = true;
        secret.default = Some(Value::from("previous-secret"));

        CustomForm {
            fields: vec![endpoint, secret],
            next_button_text: "Next".to_string(),
            next_button_state: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn secret_fields_bypass_line_input() {
        let secrets = CannedSecrets::new(&["s3cret"]);
        // One visible answer and the confirmation; nothing for the secret
        let input: &[u8] = b"ovh-eu\n\n";
        let mut prompter = Prompter::new(input, secrets.clone());

        let action = prompter.fill(&credentials_form(), false).await.unwrap();

        let mut expected = Map::new();
        expected.insert("endpoint".to_string(), Value::from("ovh-eu"));
        expected.insert("appsecret".to_string(), Value::from("s3cret"));
        assert_eq!(action, FormAction::Submit(expected));

        let prompts = secrets.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Application secret"));
        assert!(!prompts[0].contains("previous-secret"));
    }

    #[tokio::test]
    async fn back_works_from_hidden_input() {
        let secrets = CannedSecrets::new(&["<"]);
        let input: &[u8] = b"ovh-eu\n";
        let mut prompter = Prompter::new(input, secrets);

        let action = prompter.fill(&credentials_form(), false).await.unwrap();
        assert_eq!(action, FormAction::Back);
    }

    #[test]
    fn prompt_hides_secret_default() {
        let mut token = field("string");
        token.id = "token".to_string();
        token.default = Some(Value::from("abc123"));
        assert_eq!(field_prompt(&token), "token [abc123]");

        token.secret = true;
        token.placeholder = Some("xxxx".to_string());
        assert_eq!(field_prompt(&token), "token e.g. xxxx");
    }

    #[test]
    fn navigator_tracks_current_path() {
        let navigator = TerminalNavigator::new("/sources/new");
        navigator.navigate_to("/sources/3/domains");
        assert_eq!(navigator.current_path(), "/sources/3/domains");
    }
}
