//! Project risk
//!
//! Raises an alert when the share of high-risk tasks in a project reaches
//! the configured percentage.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::risk::assess_task;
use super::types::{AlertDetector, DetectorContext};
use crate::entities::{Alert, AlertEvidence, AlertSeverity, AlertType, Task};
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

/// Whole-percent share of high-risk tasks, rounded down
pub fn risk_percent(high_risk: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (high_risk * 100 / total) as u32
}

#[async_trait]
impl AlertDetector for Detector {
    fn alert_type(&self) -> AlertType {
        AlertType::ProjectRisk
    }

    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
        let high_risk_percent = ctx.threshold("high_risk_percent");
        let critical_percent = ctx.threshold("critical_percent");

        let mut projects: BTreeMap<String, Vec<Task>> = BTreeMap::new();
        for task in ctx.store.list_tasks().await? {
            projects.entry(task.project_id.clone()).or_default().push(task);
        }

        let mut alerts = Vec::new();
        for (project_id, tasks) in projects {
            let high_risk_task_ids: Vec<String> = tasks
                .iter()
                .map(|t| assess_task(t, ctx.now))
                .filter(|r| r.is_high())
                .map(|r| r.task_id)
                .collect();

            let percent = risk_percent(high_risk_task_ids.len(), tasks.len());
            if f64::from(percent) < high_risk_percent {
                continue;
            }
            let severity = if f64::from(percent) >= critical_percent {
                AlertSeverity::Critical
            } else {
                AlertSeverity::High
            };

            alerts.push(
                Alert::new(
                    AlertEvidence::ProjectRisk {
                        total_tasks: tasks.len(),
                        high_risk_tasks: high_risk_task_ids.len(),
                        risk_percent: percent,
                        high_risk_task_ids: high_risk_task_ids.clone(),
                    },
                    severity,
                    format!("Project at risk: {project_id}"),
                    format!(
                        "{} of {} tasks ({percent}%) are high risk",
                        high_risk_task_ids.len(),
                        tasks.len()
                    ),
                    ctx.now,
                )
                .for_project(&project_id),
            );
        }

        Ok(alerts)
    }
}
