//! Error types for the monitoring engine.

use thiserror::Error;

/// Errors surfaced by the monitoring engine.
#[derive(Error, Debug, Clone)]
pub enum MonitorError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid time format: '{value}' (expected HH:MM)")]
    InvalidFormat { value: String },

    #[error("Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// An unresolved alert already exists for this (type, subject) pair
    #[error("Unresolved {alert_type} alert already exists for '{subject}'")]
    DuplicateAlert { alert_type: String, subject: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Schedule rejected: {}", violations.join("; "))]
    ScheduleRejected { violations: Vec<String> },

    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl MonitorError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Transient failures are abandoned for this cycle and retried by the
    /// next scheduled pass.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::Timeout { .. })
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::StoreUnavailable {
            reason: format!("snapshot decode failed: {err}"),
        }
    }
}

/// Result type alias for engine operations
pub type MonitorResult<T> = Result<T, MonitorError>;
