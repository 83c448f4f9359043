//! Tracing-backed channel.
//!
//! Writes every notification to the structured log. This is the default
//! channel when no external delivery transport is wired in, so operators can
//! still see what would have been delivered.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ChannelError;
use crate::events::AlertNotification;
use crate::NotifyChannel;

/// Channel that records notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

impl LogChannel {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, notification: &AlertNotification) -> Result<(), ChannelError> {
        let metadata = serde_json::to_string(&notification.metadata)?;
        if notification.severity.is_urgent() {
            warn!(
                recipient = %notification.recipient_id,
                related_type = %notification.related_type,
                related_id = %notification.related_id,
                severity = notification.severity.as_str(),
                metadata = %metadata,
                "{}",
                notification.title
            );
        } else {
            info!(
                recipient = %notification.recipient_id,
                related_type = %notification.related_type,
                related_id = %notification.related_id,
                severity = notification.severity.as_str(),
                metadata = %metadata,
                "{}",
                notification.title
            );
        }
        Ok(())
    }
}
