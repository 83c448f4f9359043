//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when delivering notifications.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Recipient rejected by the channel
    #[error("Recipient '{recipient_id}' rejected: {reason}")]
    Rejected { recipient_id: String, reason: String },
}
