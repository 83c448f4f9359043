//! Notification fan-out for lab monitoring alerts.
//!
//! The monitoring engine never talks to push or email providers directly.
//! It hands [`AlertNotification`]s to a [`Notifier`], which dispatches them
//! to every enabled [`NotifyChannel`].
//!
//! # Usage
//!
//! ```no_run
//! use notify::{AlertNotification, Notifier};
//!
//! # async fn run() {
//! let notifier = Notifier::from_env();
//! let results = notifier
//!     .notify_and_wait(AlertNotification::new(
//!         "supervisor-1",
//!         "Blocked task",
//!         "Task has been blocked for 3 days",
//!         "alert",
//!         "7d1c...",
//!     ))
//!     .await;
//! # let _ = results;
//! # }
//! ```
//!
//! # Configuration
//!
//! - `NOTIFY_DISABLED`: Set to "true" to disable all notifications

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::log::LogChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{AlertNotification, Severity};

use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Central notification dispatcher.
///
/// The `Notifier` manages multiple notification channels and dispatches
/// notifications to all enabled channels.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a new notifier from environment variables.
    ///
    /// The log channel is always installed unless notifications are disabled.
    #[must_use]
    pub fn from_env() -> Self {
        let disabled = std::env::var(ENV_NOTIFY_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let channels: Vec<Arc<dyn NotifyChannel>> = vec![Arc::new(LogChannel::new())];
        info!(
            channel_count = channels.len(),
            "Notification system initialized"
        );

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Deliver a notification on every enabled channel and return the
    /// per-channel outcome.
    pub async fn notify_and_wait(
        &self,
        notification: AlertNotification,
    ) -> Vec<(String, Result<(), ChannelError>)> {
        if !self.has_channels() {
            debug!("No active channels, skipping notification");
            return vec![];
        }

        let mut results = vec![];

        for channel in &self.channels {
            if !channel.enabled() {
                debug!(channel = channel.name(), "Channel disabled, skipping");
                continue;
            }
            let channel_name = channel.name().to_string();
            let result = channel.send(&notification).await;
            results.push((channel_name, result));
        }

        results
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_env()
    }
}
