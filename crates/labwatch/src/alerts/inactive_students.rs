//! Inactive students
//!
//! Raises an alert for every monitored person with no task activity inside
//! the inactivity window, including people who never logged any.

use async_trait::async_trait;

use super::types::{AlertDetector, DetectorContext};
use crate::entities::{Alert, AlertEvidence, AlertSeverity, AlertType, Role};
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
        AlertType::InactiveStudent
    }

    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
        let window = ctx.days("inactive_days")?;
        let cutoff = ctx.before_now(window)?;
        let mut alerts = Vec::new();

        for person in ctx.store.persons_by_role(Role::MONITORED).await? {
            let last_activity_at = ctx
                .store
                .latest_activity_by(&person.id)
                .await?
                .map(|a| a.created_at);
            if last_activity_at.is_some_and(|at| at >= cutoff) {
                continue;
            }

            let days_inactive = last_activity_at.map(|at| (ctx.now - at).num_days());
            let message = match days_inactive {
                Some(days) => format!("{} has logged no task activity for {days} day(s)", person.name),
                None => format!("{} has never logged task activity", person.name),
            };

            alerts.push(
                Alert::new(
                    AlertEvidence::InactiveStudent {
                        last_activity_at,
                        days_inactive,
                        window_days: window.num_days(),
                    },
                    AlertSeverity::Medium,
                    format!("Inactive student: {}", person.name),
                    message,
                    ctx.now,
                )
                .for_user(&person.id),
            );
        }

        Ok(alerts)
    }
}
