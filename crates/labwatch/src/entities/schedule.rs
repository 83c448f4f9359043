//! Weekly work schedules and their time blocks.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Approval state of a weekly schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A person's declaration for one ISO week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub id: String,
    pub owner_id: String,
    pub week_start: NaiveDate,

    /// Cached sum of block durations. Only the schedule validator writes it.
    #[serde(default)]
    pub total_hours: f64,

    #[serde(default)]
    pub approval: ApprovalState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl WorkSchedule {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, week_start: NaiveDate) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            week_start,
            total_hours: 0.0,
            approval: ApprovalState::default(),
            approver_id: None,
            approved_at: None,
        }
    }
}

/// One contiguous planned interval within a weekly schedule.
///
/// Times are kept as the `HH:MM` strings the owner entered so a malformed
/// value fails only the check that reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub id: String,
    pub schedule_id: String,
    pub day: Weekday,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub activity: String,
}

impl ScheduleBlock {
    pub fn new(
        id: impl Into<String>,
        schedule_id: impl Into<String>,
        day: Weekday,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            schedule_id: schedule_id.into(),
            day,
            start: start.into(),
            end: end.into(),
            location: String::new(),
            activity: String::new(),
        }
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Full English day name, used in violation messages.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
