//! Due-reminder dispatch for tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::{AlertNotification, Notifier, Severity};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::delivery::deliver;
use crate::entities::{ActivityKind, TaskActivity};
use crate::errors::MonitorResult;
use crate::storage::Store;

/// Actor recorded on activity the engine writes itself
pub const SYSTEM_ACTOR: &str = "system";

/// Summary of one reminder pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderReport {
    pub tasks: usize,
    pub notifications: usize,
}

/// Sends due task reminders to assignees
pub struct ReminderDispatcher {
    store: Arc<dyn Store>,
    notifier: Arc<Notifier>,
    notify_timeout: Duration,
}

impl ReminderDispatcher {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<Notifier>, notify_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            notify_timeout,
        }
    }

    /// Notify assignees of every incomplete task whose reminder is due, then
    /// clear the reminder so it fires once.
    pub async fn dispatch_due_reminders(&self, now: DateTime<Utc>) -> MonitorResult<ReminderReport> {
        let mut report = ReminderReport::default();

        for mut task in self.store.tasks_with_due_reminders(now).await? {
            let Some(remind_at) = task.reminder_at.take() else {
                continue;
            };

            let due = task
                .due_at
                .map_or_else(|| "no due date".to_string(), |d| format!("due {}", d.format("%Y-%m-%d %H:%M UTC")));
            let mut sent = 0;
            for assignee in &task.assignees {
                let notification = AlertNotification::new(
                    assignee,
                    format!("Reminder: {}", task.title),
                    format!("Task '{}' ({due}) is at {}% progress", task.title, task.progress),
                    "task",
                    &task.id,
                )
                .with_severity(Severity::Low)
                .with_metadata("remindAt", remind_at.to_rfc3339());

                if deliver(&self.notifier, notification, self.notify_timeout).await {
                    sent += 1;
                }
            }
            if task.assignees.is_empty() {
                warn!(task = %task.id, "Reminder due on a task with no assignees");
            }

            let note = TaskActivity::new(
                &task.id,
                SYSTEM_ACTOR,
                ActivityKind::Comment,
                format!("Reminder sent to {sent} assignee(s)"),
                now,
            );
            self.store.update_task_with_activity(&task, note).await?;

            report.tasks += 1;
            report.notifications += sent;
        }

        if report.tasks > 0 {
            info!(tasks = report.tasks, notifications = report.notifications, "Dispatched due reminders");
        }
        Ok(report)
    }
}
