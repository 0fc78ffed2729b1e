//! Server-described forms and source records
//!
//! The server owns the step sequence. Each step is described by a
//! [`CustomForm`]; the last step yields a [`SourceRecord`] instead.

use serde::{Deserialize, Serialize};

use crate::state::StepIndex;

/// A single input presented to the user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceField {
    /// Key under which the value is stored in the settings resource
    pub id: String,

    /// Value type as understood by the server (e.g. "string", "bool")
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Value used when the user leaves the field untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Allowed values, when the field is a selection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default)]
    pub required: bool,

    /// The value must not be echoed back to the user
    #[serde(default)]
    pub secret: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Form description for one step of the wizard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomForm {
    /// Text presented before the fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub before_text: String,

    /// Text displayed in the sidebar, when there is one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub side_text: String,

    /// Text presented after the fields, before the buttons
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after_text: String,

    /// Fields presented to the user
    #[serde(default)]
    pub fields: Vec<SourceField>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_button_text: String,

    /// Next button text when updating an existing source
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_edit_button_text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_button_text: String,

    /// Previous button text when updating an existing source
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_edit_button_text: String,

    /// External target of the next button, exclusive with `next_button_state`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_button_link: String,

    /// Step requested when the form is submitted
    #[serde(default)]
    pub next_button_state: StepIndex,

    /// Step requested by the previous button; negative leaves the wizard
    #[serde(default)]
    pub previous_button_state: StepIndex,
}

impl CustomForm {
    /// Label of the next button, preferring the edit text when updating
    pub fn next_label(&self, editing: bool) -> &str {
        if editing && !self.next_edit_button_text.is_empty() {
            &self.next_edit_button_text
        } else {
            &self.next_button_text
        }
    }

    /// Label of the previous button, preferring the edit text when updating
    pub fn previous_label(&self, editing: bool) -> &str {
        if editing && !self.previous_edit_button_text.is_empty() {
            &self.previous_edit_button_text
        } else {
            &self.previous_button_text
        }
    }

    /// Step to request on submit, or `None` when the button is an external link
    pub fn next_target(&self) -> Option<StepIndex> {
        if self.next_button_link.is_empty() {
            Some(self.next_button_state)
        } else {
            None
        }
    }

    /// Step to request on "previous", or `None` when it leaves the wizard
    pub fn previous_target(&self) -> Option<StepIndex> {
        (self.previous_button_state >= 0).then_some(self.previous_button_state)
    }
}

/// A source as stored by the server once created or updated
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Server-assigned identifier (numeric or string depending on the backend)
    #[serde(rename = "_id", default, skip_serializing_if = "serde_json::Value::is_null")]
    pub id: serde_json::Value,

    /// Source type identifier
    #[serde(rename = "_srctype", default, skip_serializing_if = "String::is_empty")]
    pub source_type: String,

    /// User-supplied label
    #[serde(rename = "_comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    /// Provider-specific members, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SourceRecord {
    /// Identifier rendered as a path segment, `None` when the server sent none
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Label used in notifications, `None` when the comment is blank
    pub fn display_comment(&self) -> Option<&str> {
        (!self.comment.is_empty()).then_some(self.comment.as_str())
    }
}
