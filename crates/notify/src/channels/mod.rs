//! Notification channel implementations.

pub mod log;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::AlertNotification;

/// Trait for notification channels (in-app inbox, push, email, ...).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver a single notification to this channel.
    async fn send(&self, notification: &AlertNotification) -> Result<(), ChannelError>;
}
