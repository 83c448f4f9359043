//! Engine services: schedule validation, task lifecycle, velocity and
//! reminders.

pub mod lifecycle;
pub mod reminders;
pub mod schedule;
pub mod time;
pub mod velocity;

pub use lifecycle::{ReviewAction, TaskLifecycle};
pub use reminders::{ReminderDispatcher, ReminderReport, SYSTEM_ACTOR};
pub use schedule::{
    check_blocks, ComplianceRow, SchedulePolicy, ScheduleValidation, ScheduleValidator,
};
pub use time::{block_duration_hours, blocks_overlap, intervals_overlap, parse_time_to_minutes};
pub use velocity::{compute_metric, VelocityAnalyzer, MAX_WINDOW_DAYS};
