//! Storage trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::entities::{
    Alert, AlertConfiguration, AlertType, Person, Role, ScheduleBlock, Task, TaskActivity,
    TaskStatus, WorkSchedule,
};
use crate::errors::MonitorResult;

/// Filter for unresolved-alert queries
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    /// Linked entity (task, person or project id depending on the type)
    pub subject: Option<String>,
    pub user_id: Option<String>,
}

impl AlertFilter {
    /// Filter matching the dedup key of an alert
    pub fn dedup_key(alert_type: AlertType, subject: impl Into<String>) -> Self {
        Self {
            alert_type: Some(alert_type),
            subject: Some(subject.into()),
            user_id: None,
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.alert_type.map_or(true, |t| t == alert.alert_type)
            && self.subject.as_deref().map_or(true, |s| s == alert.subject())
            && self
                .user_id
                .as_deref()
                .map_or(true, |u| alert.mentions_user(u))
    }
}

/// Data-access interface the engine runs against.
///
/// Implementations must reject a second unresolved alert for the same
/// `(type, subject)` with [`MonitorError::DuplicateAlert`](crate::MonitorError).
#[async_trait]
pub trait Store: Send + Sync {
    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    // === Task Operations ===

    async fn insert_task(&self, task: Task) -> MonitorResult<()>;

    async fn get_task(&self, task_id: &str) -> MonitorResult<Option<Task>>;

    async fn list_tasks(&self) -> MonitorResult<Vec<Task>>;

    async fn tasks_by_project(&self, project_id: &str) -> MonitorResult<Vec<Task>>;

    async fn tasks_by_assignee(&self, person_id: &str) -> MonitorResult<Vec<Task>>;

    async fn tasks_by_status(&self, status: TaskStatus) -> MonitorResult<Vec<Task>>;

    /// Non-completed tasks whose reminder time is at or before `now`
    async fn tasks_with_due_reminders(&self, now: DateTime<Utc>) -> MonitorResult<Vec<Task>>;

    /// Replace a stored task (status, progress, checklist, reminder) and
    /// record the activity describing the change, as one write.
    ///
    /// Nothing is written when the task does not exist.
    async fn update_task_with_activity(
        &self,
        task: &Task,
        activity: TaskActivity,
    ) -> MonitorResult<()>;

    // === Activity Operations ===

    async fn append_activity(&self, activity: TaskActivity) -> MonitorResult<()>;

    async fn activity_for_task(&self, task_id: &str) -> MonitorResult<Vec<TaskActivity>>;

    /// Activity at or after `since`, optionally restricted to one actor
    async fn activity_since(
        &self,
        actor_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> MonitorResult<Vec<TaskActivity>>;

    /// Most recent activity by an actor, at any time
    async fn latest_activity_by(&self, actor_id: &str) -> MonitorResult<Option<TaskActivity>>;

    // === Schedule Operations ===

    async fn insert_schedule(&self, schedule: WorkSchedule) -> MonitorResult<()>;

    async fn get_schedule(&self, schedule_id: &str) -> MonitorResult<Option<WorkSchedule>>;

    async fn schedules_for_week(
        &self,
        person_id: &str,
        week_start: NaiveDate,
    ) -> MonitorResult<Vec<WorkSchedule>>;

    async fn all_schedules_for_week(&self, week_start: NaiveDate)
        -> MonitorResult<Vec<WorkSchedule>>;

    async fn update_schedule(&self, schedule: &WorkSchedule) -> MonitorResult<()>;

    async fn blocks_for_schedule(&self, schedule_id: &str) -> MonitorResult<Vec<ScheduleBlock>>;

    async fn get_block(&self, block_id: &str) -> MonitorResult<Option<ScheduleBlock>>;

    async fn insert_block(&self, block: ScheduleBlock) -> MonitorResult<()>;

    async fn update_block(&self, block: &ScheduleBlock) -> MonitorResult<()>;

    async fn delete_block(&self, block_id: &str) -> MonitorResult<()>;

    async fn set_schedule_hours(&self, schedule_id: &str, total_hours: f64) -> MonitorResult<()>;

    // === Alert Operations ===

    /// Insert a new alert, enforcing the unresolved `(type, subject)` constraint
    async fn insert_alert(&self, alert: Alert) -> MonitorResult<()>;

    async fn get_alert(&self, alert_id: Uuid) -> MonitorResult<Option<Alert>>;

    async fn unresolved_alerts(&self, filter: &AlertFilter) -> MonitorResult<Vec<Alert>>;

    /// All alerts (resolved or not) of a type created at or after `since`
    async fn alerts_created_since(
        &self,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> MonitorResult<Vec<Alert>>;

    async fn mark_resolved(
        &self,
        alert_id: Uuid,
        resolver_id: &str,
        at: DateTime<Utc>,
        note: Option<&str>,
    ) -> MonitorResult<Alert>;

    // === Configuration Operations ===

    async fn get_configuration(
        &self,
        alert_type: AlertType,
    ) -> MonitorResult<Option<AlertConfiguration>>;

    /// Insert only when no row exists for the type; returns whether it inserted
    async fn insert_configuration_if_absent(
        &self,
        config: AlertConfiguration,
    ) -> MonitorResult<bool>;

    async fn update_configuration(&self, config: &AlertConfiguration) -> MonitorResult<()>;

    // === Directory Operations ===

    async fn insert_person(&self, person: Person) -> MonitorResult<()>;

    async fn persons_by_role(&self, role: Role) -> MonitorResult<Vec<Person>>;
}
