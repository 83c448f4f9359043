//! Blocked tasks
//!
//! Raises an alert for every task that has sat in `blocked` without any
//! update for at least the configured number of hours.

use async_trait::async_trait;

use super::types::{AlertDetector, DetectorContext};
use crate::entities::{Alert, AlertEvidence, AlertSeverity, AlertType, TaskStatus};
use crate::errors::MonitorResult;

pub struct Detector;

impl Detector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertDetector for Detector {
    fn alert_type(&self) -> AlertType {
        AlertType::BlockedTask
    }

    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
        let threshold = ctx.hours("blocked_hours")?;

        let alerts = ctx
            .store
            .tasks_by_status(TaskStatus::Blocked)
            .await?
            .into_iter()
            .filter(|t| ctx.now - t.updated_at >= threshold)
            .map(|task| {
                let hours_blocked = (ctx.now - task.updated_at).num_hours();
                let mut alert = Alert::new(
                    AlertEvidence::BlockedTask {
                        task_title: task.title.clone(),
                        blocked_since: task.updated_at,
                        hours_blocked,
                    },
                    AlertSeverity::High,
                    format!("Blocked task: {}", task.title),
                    format!("'{}' has been blocked for {hours_blocked} hours", task.title),
                    ctx.now,
                )
                .for_task(&task.id)
                .for_project(&task.project_id);
                if let Some(assignee) = task.assignees.first() {
                    alert = alert.for_user(assignee);
                }
                alert
            })
            .collect();

        Ok(alerts)
    }
}
