//! Velocity drop
//!
//! Raises an alert for a student whose activity is trending down and whose
//! velocity score fell under the threshold.

use std::collections::HashSet;

use async_trait::async_trait;

use super::types::{AlertDetector, DetectorContext};
use crate::domain::VelocityAnalyzer;
use crate::entities::{Alert, AlertEvidence, AlertSeverity, AlertType, Role, VelocityTrend};
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
        AlertType::VelocityDrop
    }

    async fn detect(&self, ctx: &DetectorContext) -> MonitorResult<Vec<Alert>> {
        let window_days = ctx.threshold("window_days").max(1.0) as u32;
        let score_threshold = ctx.threshold("score_threshold");

        let students: HashSet<String> = ctx
            .store
            .persons_by_role(Role::MONITORED)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let metrics = VelocityAnalyzer::new(ctx.store.clone())
            .analyze(None, window_days, ctx.now)
            .await?;

        let alerts = metrics
            .into_iter()
            .filter(|m| students.contains(&m.person_id))
            .filter(|m| {
                m.trend == VelocityTrend::Decreasing && f64::from(m.velocity_score) < score_threshold
            })
            .map(|m| {
                Alert::new(
                    AlertEvidence::VelocityDrop {
                        velocity_score: m.velocity_score,
                        trend: m.trend,
                        window_days: m.window_days,
                        first_half: m.first_half,
                        second_half: m.second_half,
                    },
                    AlertSeverity::Medium,
                    format!("Velocity drop: {}", m.person_id),
                    format!(
                        "Activity fell from {} to {} events between the halves of the last {} days (score {})",
                        m.first_half, m.second_half, m.window_days, m.velocity_score
                    ),
                    ctx.now,
                )
                .for_user(&m.person_id)
            })
            .collect();

        Ok(alerts)
    }
}
