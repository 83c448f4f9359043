//! Core entities of the monitoring engine.

mod alert;
mod person;
mod schedule;
mod task;
mod velocity;

pub use alert::{Alert, AlertConfiguration, AlertEvidence, AlertSeverity, AlertType, DeliveryChannels};
pub use person::{Person, Role};
pub use schedule::{day_name, week_start_of, ApprovalState, ScheduleBlock, WorkSchedule};
pub use task::{ActivityKind, ChecklistItem, Task, TaskActivity, TaskPriority, TaskStatus};
pub use velocity::{VelocityMetric, VelocityTrend};
