//! Alerts, their typed evidence and per-type policy.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TaskStatus, VelocityTrend};

/// The five detectable risk conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    OverdueTask,
    InactiveStudent,
    ProjectRisk,
    VelocityDrop,
    BlockedTask,
}

impl AlertType {
    pub const ALL: [AlertType; 5] = [
        AlertType::OverdueTask,
        AlertType::InactiveStudent,
        AlertType::ProjectRisk,
        AlertType::VelocityDrop,
        AlertType::BlockedTask,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OverdueTask => "overdue_task",
            Self::InactiveStudent => "inactive_student",
            Self::ProjectRisk => "project_risk",
            Self::VelocityDrop => "velocity_drop",
            Self::BlockedTask => "blocked_task",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OverdueTask => "Overdue Task",
            Self::InactiveStudent => "Inactive Student",
            Self::ProjectRisk => "Project At Risk",
            Self::VelocityDrop => "Velocity Drop",
            Self::BlockedTask => "Blocked Task",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_lowercase().replace('-', "_"))
            .ok_or_else(|| format!("unknown alert type: '{s}'"))
    }
}

/// Alert severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<AlertSeverity> for notify::Severity {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Low => Self::Low,
            AlertSeverity::Medium => Self::Medium,
            AlertSeverity::High => Self::High,
            AlertSeverity::Critical => Self::Critical,
        }
    }
}

/// Evidence recorded by the detector that raised an alert.
///
/// One variant per alert type, so each detector's payload shape is fixed
/// while still serializing uniformly for storage and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AlertEvidence {
    OverdueTask {
        task_title: String,
        due_at: DateTime<Utc>,
        days_overdue: i64,
        status: TaskStatus,
        progress: u8,
    },
    InactiveStudent {
        last_activity_at: Option<DateTime<Utc>>,
        days_inactive: Option<i64>,
        window_days: i64,
    },
    ProjectRisk {
        total_tasks: usize,
        high_risk_tasks: usize,
        risk_percent: u32,
        high_risk_task_ids: Vec<String>,
    },
    VelocityDrop {
        velocity_score: u32,
        trend: VelocityTrend,
        window_days: u32,
        first_half: usize,
        second_half: usize,
    },
    BlockedTask {
        task_title: String,
        blocked_since: DateTime<Utc>,
        hours_blocked: i64,
    },
}

impl AlertEvidence {
    pub fn alert_type(&self) -> AlertType {
        match self {
            Self::OverdueTask { .. } => AlertType::OverdueTask,
            Self::InactiveStudent { .. } => AlertType::InactiveStudent,
            Self::ProjectRisk { .. } => AlertType::ProjectRisk,
            Self::VelocityDrop { .. } => AlertType::VelocityDrop,
            Self::BlockedTask { .. } => AlertType::BlockedTask,
        }
    }
}

/// A detected risk condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    pub data: AlertEvidence,

    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Create an unresolved alert; the type follows from the evidence.
    pub fn new(
        data: AlertEvidence,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type: data.alert_type(),
            severity,
            title: title.into(),
            message: message.into(),
            user_id: None,
            project_id: None,
            task_id: None,
            data,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolution_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// The linked entity this alert is about; half of the dedup key.
    pub fn subject(&self) -> &str {
        let linked = match self.alert_type {
            AlertType::OverdueTask | AlertType::BlockedTask => &self.task_id,
            AlertType::InactiveStudent | AlertType::VelocityDrop => &self.user_id,
            AlertType::ProjectRisk => &self.project_id,
        };
        linked.as_deref().unwrap_or_default()
    }

    /// Whether the alert is linked to the given person
    pub fn mentions_user(&self, person_id: &str) -> bool {
        self.user_id.as_deref() == Some(person_id)
    }
}

/// Delivery channel switches for one alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryChannels {
    pub in_app: bool,
    pub email: bool,
    pub push: bool,
}

impl Default for DeliveryChannels {
    fn default() -> Self {
        Self {
            in_app: true,
            email: false,
            push: false,
        }
    }
}

/// Per-type detection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfiguration {
    pub alert_type: AlertType,
    pub enabled: bool,
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    pub channels: DeliveryChannels,
    pub max_alerts_per_day: u32,
    pub cooldown_hours: u32,
}

impl AlertConfiguration {
    /// Seed policy for a type
    pub fn default_for(alert_type: AlertType) -> Self {
        let (thresholds, max_alerts_per_day, cooldown_hours, channels): (Vec<(&str, f64)>, u32, u32, _) =
            match alert_type {
                AlertType::OverdueTask => (
                    vec![("grace_days", 1.0), ("high_days", 3.0), ("critical_days", 7.0)],
                    50,
                    24,
                    DeliveryChannels {
                        in_app: true,
                        email: true,
                        push: false,
                    },
                ),
                AlertType::InactiveStudent => (
                    vec![("inactive_days", 7.0)],
                    50,
                    24,
                    DeliveryChannels::default(),
                ),
                AlertType::ProjectRisk => (
                    vec![("high_risk_percent", 60.0), ("critical_percent", 80.0)],
                    20,
                    12,
                    DeliveryChannels {
                        in_app: true,
                        email: true,
                        push: true,
                    },
                ),
                AlertType::VelocityDrop => (
                    vec![("window_days", 14.0), ("score_threshold", 30.0)],
                    50,
                    48,
                    DeliveryChannels::default(),
                ),
                AlertType::BlockedTask => (
                    vec![("blocked_hours", 48.0)],
                    50,
                    12,
                    DeliveryChannels {
                        in_app: true,
                        email: false,
                        push: true,
                    },
                ),
            };

        Self {
            alert_type,
            enabled: true,
            thresholds: thresholds
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
            channels,
            max_alerts_per_day,
            cooldown_hours,
        }
    }

    /// Named threshold, falling back to the seed value when absent.
    pub fn threshold(&self, key: &str) -> f64 {
        self.thresholds
            .get(key)
            .copied()
            .or_else(|| Self::default_for(self.alert_type).thresholds.get(key).copied())
            .unwrap_or_default()
    }
}
