//! Notification payloads handed to delivery channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity levels carried on notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether this severity should interrupt the recipient (push-worthy).
    #[must_use]
    pub const fn is_urgent(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// A single addressed notification.
///
/// This is the `(recipient, title, message, related type, related id,
/// metadata)` tuple the monitoring engine produces for every new alert and
/// every due reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    /// Kind of entity the notification points at (`alert`, `task`, ...)
    pub related_type: String,
    pub related_id: String,
    pub severity: Severity,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AlertNotification {
    pub fn new(
        recipient_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        related_type: impl Into<String>,
        related_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            title: title.into(),
            message: message.into(),
            related_type: related_type.into(),
            related_id: related_id.into(),
            severity: Severity::Medium,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
