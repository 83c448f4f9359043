//! Per-task risk scoring.
//!
//! | factor | points |
//! |---|---|
//! | overdue and incomplete | 40 |
//! | blocked | 30 |
//! | no update for more than 7 days | 20 |
//! | progress under 25% and no update for more than 3 days | 10 |
//!
//! 50 or more is high risk, 25 or more is medium.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Task, TaskStatus};

const HIGH_RISK_SCORE: u32 = 50;
const MEDIUM_RISK_SCORE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_RISK_SCORE {
            Self::High
        } else if score >= MEDIUM_RISK_SCORE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Risk assessment for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRisk {
    pub task_id: String,
    pub score: u32,
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

impl TaskRisk {
    pub fn is_high(&self) -> bool {
        self.level == RiskLevel::High
    }
}

pub fn assess_task(task: &Task, now: DateTime<Utc>) -> TaskRisk {
    let idle = now - task.updated_at;
    let mut score = 0;
    let mut factors = Vec::new();

    if task.is_overdue(now) {
        score += 40;
        factors.push("overdue".to_string());
    }
    if task.status == TaskStatus::Blocked {
        score += 30;
        factors.push("blocked".to_string());
    }
    if idle > Duration::days(7) {
        score += 20;
        factors.push(format!("no update for {} days", idle.num_days()));
    }
    if task.progress < 25 && idle > Duration::days(3) {
        score += 10;
        factors.push(format!("low progress ({}%)", task.progress));
    }

    TaskRisk {
        task_id: task.id.clone(),
        score,
        level: RiskLevel::from_score(score),
        factors,
    }
}
