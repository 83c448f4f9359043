//! Derived per-person velocity metrics (never persisted).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ActivityKind;

/// Trend of activity between the two halves of an analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityTrend {
    Increasing,
    Decreasing,
    Stable,
    New,
    Inactive,
}

impl VelocityTrend {
    /// Classify from the event counts in each half of the window.
    pub fn classify(first_half: usize, second_half: usize) -> Self {
        match (first_half, second_half) {
            (0, 0) => Self::Inactive,
            (0, _) => Self::New,
            (f, s) if s > f => Self::Increasing,
            (f, s) if s < f => Self::Decreasing,
            _ => Self::Stable,
        }
    }
}

impl std::fmt::Display for VelocityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::New => "new",
            Self::Inactive => "inactive",
        };
        f.write_str(label)
    }
}

/// Activity aggregate for one person over one window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityMetric {
    pub person_id: String,
    pub window_days: u32,
    pub total_activities: usize,
    pub by_kind: BTreeMap<ActivityKind, usize>,
    pub distinct_tasks: usize,
    pub distinct_projects: usize,
    pub daily: BTreeMap<NaiveDate, usize>,
    pub first_half: usize,
    pub second_half: usize,
    pub velocity_score: u32,
    pub trend: VelocityTrend,
}
