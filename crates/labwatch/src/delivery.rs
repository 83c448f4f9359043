//! Bounded hand-off of notifications to the notifier.

use std::time::Duration;

use notify::{AlertNotification, Notifier};
use tracing::{debug, warn};

/// Deliver one notification, waiting at most `limit`.
///
/// Returns whether every channel accepted it. Failures and timeouts are
/// logged here and never surface to the caller.
pub(crate) async fn deliver(
    notifier: &Notifier,
    notification: AlertNotification,
    limit: Duration,
) -> bool {
    let recipient = notification.recipient_id.clone();
    let related_id = notification.related_id.clone();

    match tokio::time::timeout(limit, notifier.notify_and_wait(notification)).await {
        Ok(results) => {
            let mut delivered = true;
            for (channel, result) in results {
                if let Err(e) = result {
                    delivered = false;
                    warn!(
                        channel = %channel,
                        recipient = %recipient,
                        related_id = %related_id,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
            debug!(recipient = %recipient, related_id = %related_id, delivered, "Notification handed off");
            delivered
        }
        Err(_) => {
            warn!(
                recipient = %recipient,
                related_id = %related_id,
                timeout_secs = limit.as_secs(),
                "Notification delivery timed out"
            );
            false
        }
    }
}
