// # Wizard Settings
//
// Accumulated configuration payload for the source under construction.
//
// ## Lifecycle
//
// - Reset to empty when the wizard is mounted
// - Grown field by field as the user fills in each step's form
// - Sent unchanged with every step request
// - Superseded once the server reports the source as created/updated
//
// The wire names (`Source`, `_comment`, `redirect`) are those of the
// source settings API; the struct is the request body as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Member of the resource carrying the identifier of an existing source
pub const RESOURCE_ID_KEY: &str = "_id";

/// Accumulated settings for the source being configured
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WizardSettings {
    /// Provider-specific fields
    #[serde(rename = "Source", default)]
    pub resource: Map<String, Value>,

    /// Free-text label of the source
    #[serde(rename = "_comment", default)]
    pub comment: String,

    /// Path the server asked the client to navigate to next
    #[serde(rename = "redirect", default)]
    pub redirect_hint: Option<String>,
}

impl WizardSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the resource, the comment and the redirect hint
    pub fn reset(&mut self) {
        self.resource = Map::new();
        self.comment = String::new();
        self.redirect_hint = None;
    }

    /// Store a field value in the resource, replacing any previous value
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.resource.insert(key.into(), value);
    }

    /// Merge a batch of field values into the resource
    pub fn merge(&mut self, values: Map<String, Value>) {
        self.resource.extend(values);
    }

    /// Identifier of the source being edited, if any
    pub fn existing_id(&self) -> Option<&Value> {
        self.resource
            .get(RESOURCE_ID_KEY)
            .filter(|id| !is_blank(id))
    }

    /// Whether these settings update an existing source rather than create one
    pub fn is_update(&self) -> bool {
        self.existing_id().is_some()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_i64() == Some(0),
        Value::Bool(b) => !b,
        _ => false,
    }
}
