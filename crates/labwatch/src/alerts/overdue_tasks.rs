//! Overdue tasks
//!
//! Raises one alert per incomplete task whose due date passed more than the
//! grace period ago.

use async_trait::async_trait;

use super::types::{AlertDetector, DetectorContext};
use crate::entities::{Alert, AlertEvidence, AlertSeverity, AlertType};
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

/// Severity by whole days overdue
pub fn severity_for(days_overdue: i64, high_days: f64, critical_days: f64) -> AlertSeverity {
    let days = days_overdue as f64;
    if days >= critical_days {
        AlertSeverity::Critical
    } else if days >= high_days {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

#[async_trait]
impl AlertDetector for Detector {
    fn alert_type(&self) -> AlertType {
        AlertType::OverdueTask
    }

    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
        let cutoff = ctx.before_now(ctx.days("grace_days")?)?;
        let high_days = ctx.threshold("high_days");
        let critical_days = ctx.threshold("critical_days");

        let alerts = ctx
            .store
            .list_tasks()
            .await?
            .into_iter()
            .filter(|t| !t.is_completed())
            .filter_map(|task| {
                let due_at = task.due_at.filter(|due| *due < cutoff)?;
                let days_overdue = (ctx.now - due_at).num_days();
                let severity = severity_for(days_overdue, high_days, critical_days);

                let mut alert = Alert::new(
                    AlertEvidence::OverdueTask {
                        task_title: task.title.clone(),
                        due_at,
                        days_overdue,
                        status: task.status,
                        progress: task.progress,
                    },
                    severity,
                    format!("Overdue task: {}", task.title),
                    format!(
                        "'{}' is {days_overdue} day(s) past its due date at {}% progress",
                        task.title, task.progress
                    ),
                    ctx.now,
                )
                .for_task(&task.id)
                .for_project(&task.project_id);
                if let Some(assignee) = task.assignees.first() {
                    alert = alert.for_user(assignee);
                }
                Some(alert)
            })
            .collect();

        Ok(alerts)
    }
}
