//! Notification sink
//!
//! Fire-and-forget capability used for both the success-on-create and the
//! failure paths. Presentation (toast, terminal line, log entry) belongs to
//! the implementation.

use std::time::Duration;

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Danger => "danger",
        }
    }
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// How long the notification stays visible
    pub duration: Duration,
}

/// Trait for notification sinks
///
/// Must not block: the wizard calls it from its transition task.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
