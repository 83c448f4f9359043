//! Risk detection.
//!
//! Each detector inspects current state and proposes alerts; emission
//! dedups them against unresolved alerts before anything is stored.
//!
//! # Detectors
//! - Overdue tasks: incomplete work past its due date plus a grace period
//! - Inactive students: monitored people with no recent task activity
//! - Project risk: projects where most tasks are individually high risk
//! - Velocity drop: declining activity with a low velocity score
//! - Blocked tasks: tasks stuck in `blocked` past a time limit

pub mod blocked_tasks;
pub mod emit;
pub mod inactive_students;
pub mod overdue_tasks;
pub mod project_risk;
pub mod risk;
pub mod types;
pub mod velocity_drop;

use std::sync::Arc;

pub use emit::{emit, is_open, Emission};
pub use risk::{assess_task, RiskLevel, TaskRisk};
pub use types::{AlertDetector, DetectorContext};

use crate::entities::AlertType;

/// Registry of alert detectors
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn AlertDetector>>,
}

impl DetectorRegistry {
    /// Registry with all five detectors
    pub fn new() -> Self {
        Self {
            detectors: vec![
                Arc::new(overdue_tasks::Detector::new()),
                Arc::new(inactive_students::Detector::new()),
                Arc::new(project_risk::Detector::new()),
                Arc::new(velocity_drop::Detector::new()),
                Arc::new(blocked_tasks::Detector::new()),
            ],
        }
    }

    pub fn with_detectors(detectors: Vec<Arc<dyn AlertDetector>>) -> Self {
        Self { detectors }
    }

    pub fn get(&self, alert_type: AlertType) -> Option<&Arc<dyn AlertDetector>> {
        self.detectors.iter().find(|d| d.alert_type() == alert_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AlertDetector>> {
        self.detectors.iter()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
