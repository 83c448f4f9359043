//! In-memory store with JSON snapshot persistence.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::traits::{AlertFilter, Store};
use crate::entities::{
    Alert, AlertConfiguration, AlertType, Person, Role, ScheduleBlock, Task, TaskActivity,
    TaskStatus, WorkSchedule,
};
use crate::errors::{MonitorError, MonitorResult};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    tasks: BTreeMap<String, Task>,
    #[serde(default)]
    activity: Vec<TaskActivity>,
    #[serde(default)]
    schedules: BTreeMap<String, WorkSchedule>,
    #[serde(default)]
    blocks: BTreeMap<String, ScheduleBlock>,
    #[serde(default)]
    alerts: Vec<Alert>,
    #[serde(default)]
    configurations: Vec<AlertConfiguration>,
    #[serde(default)]
    persons: BTreeMap<String, Person>,
}

/// Store backed by process memory.
///
/// Enforces the same uniqueness rule a relational backend would carry as a
/// partial unique index on `(alert_type, subject) WHERE NOT resolved`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot file; a missing file yields an empty store.
    pub async fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let snapshot = match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No snapshot found, starting empty");
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: RwLock::new(snapshot),
        })
    }

    /// Write the full state to a snapshot file.
    pub async fn save(&self, path: impl AsRef<Path>) -> MonitorResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };
        fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn storage_type(&self) -> &'static str {
        "memory"
    }

    async fn insert_task(&self, task: Task) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        state.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> MonitorResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(task_id).cloned())
    }

    async fn list_tasks(&self) -> MonitorResult<Vec<Task>> {
        Ok(self.state.read().await.tasks.values().cloned().collect())
    }

    async fn tasks_by_project(&self, project_id: &str) -> MonitorResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn tasks_by_assignee(&self, person_id: &str) -> MonitorResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.assignees.iter().any(|a| a == person_id))
            .cloned()
            .collect())
    }

    async fn tasks_by_status(&self, status: TaskStatus) -> MonitorResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect())
    }

    async fn tasks_with_due_reminders(&self, now: DateTime<Utc>) -> MonitorResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| !t.is_completed() && t.reminder_at.is_some_and(|at| at <= now))
            .cloned()
            .collect())
    }

    async fn update_task_with_activity(
        &self,
        task: &Task,
        activity: TaskActivity,
    ) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| MonitorError::not_found("Task", &task.id))?;
        *slot = task.clone();
        state.activity.push(activity);
        Ok(())
    }

    async fn append_activity(&self, activity: TaskActivity) -> MonitorResult<()> {
        self.state.write().await.activity.push(activity);
        Ok(())
    }

    async fn activity_for_task(&self, task_id: &str) -> MonitorResult<Vec<TaskActivity>> {
        let state = self.state.read().await;
        Ok(state
            .activity
            .iter()
            .filter(|a| a.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn activity_since(
        &self,
        actor_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> MonitorResult<Vec<TaskActivity>> {
        let state = self.state.read().await;
        Ok(state
            .activity
            .iter()
            .filter(|a| a.created_at >= since)
            .filter(|a| actor_id.map_or(true, |id| a.actor_id == id))
            .cloned()
            .collect())
    }

    async fn latest_activity_by(&self, actor_id: &str) -> MonitorResult<Option<TaskActivity>> {
        let state = self.state.read().await;
        Ok(state
            .activity
            .iter()
            .filter(|a| a.actor_id == actor_id)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn insert_schedule(&self, schedule: WorkSchedule) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        state.schedules.insert(schedule.id.clone(), schedule);
        Ok(())
    }

    async fn get_schedule(&self, schedule_id: &str) -> MonitorResult<Option<WorkSchedule>> {
        Ok(self.state.read().await.schedules.get(schedule_id).cloned())
    }

    async fn schedules_for_week(
        &self,
        person_id: &str,
        week_start: NaiveDate,
    ) -> MonitorResult<Vec<WorkSchedule>> {
        let state = self.state.read().await;
        Ok(state
            .schedules
            .values()
            .filter(|s| s.owner_id == person_id && s.week_start == week_start)
            .cloned()
            .collect())
    }

    async fn all_schedules_for_week(
        &self,
        week_start: NaiveDate,
    ) -> MonitorResult<Vec<WorkSchedule>> {
        let state = self.state.read().await;
        Ok(state
            .schedules
            .values()
            .filter(|s| s.week_start == week_start)
            .cloned()
            .collect())
    }

    async fn update_schedule(&self, schedule: &WorkSchedule) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .schedules
            .get_mut(&schedule.id)
            .ok_or_else(|| MonitorError::not_found("Schedule", &schedule.id))?;
        *slot = schedule.clone();
        Ok(())
    }

    async fn blocks_for_schedule(&self, schedule_id: &str) -> MonitorResult<Vec<ScheduleBlock>> {
        let state = self.state.read().await;
        Ok(state
            .blocks
            .values()
            .filter(|b| b.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn get_block(&self, block_id: &str) -> MonitorResult<Option<ScheduleBlock>> {
        Ok(self.state.read().await.blocks.get(block_id).cloned())
    }

    async fn insert_block(&self, block: ScheduleBlock) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        if !state.schedules.contains_key(&block.schedule_id) {
            return Err(MonitorError::not_found("Schedule", &block.schedule_id));
        }
        state.blocks.insert(block.id.clone(), block);
        Ok(())
    }

    async fn update_block(&self, block: &ScheduleBlock) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .blocks
            .get_mut(&block.id)
            .ok_or_else(|| MonitorError::not_found("Schedule block", &block.id))?;
        *slot = block.clone();
        Ok(())
    }

    async fn delete_block(&self, block_id: &str) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        state
            .blocks
            .remove(block_id)
            .map(|_| ())
            .ok_or_else(|| MonitorError::not_found("Schedule block", block_id))
    }

    async fn set_schedule_hours(&self, schedule_id: &str, total_hours: f64) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        let schedule = state
            .schedules
            .get_mut(schedule_id)
            .ok_or_else(|| MonitorError::not_found("Schedule", schedule_id))?;
        schedule.total_hours = total_hours;
        Ok(())
    }

    async fn insert_alert(&self, alert: Alert) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        if !alert.resolved {
            let duplicate = state.alerts.iter().any(|existing| {
                !existing.resolved
                    && existing.alert_type == alert.alert_type
                    && existing.subject() == alert.subject()
            });
            if duplicate {
                return Err(MonitorError::DuplicateAlert {
                    alert_type: alert.alert_type.to_string(),
                    subject: alert.subject().to_string(),
                });
            }
        }
        state.alerts.push(alert);
        Ok(())
    }

    async fn get_alert(&self, alert_id: Uuid) -> MonitorResult<Option<Alert>> {
        let state = self.state.read().await;
        Ok(state.alerts.iter().find(|a| a.id == alert_id).cloned())
    }

    async fn unresolved_alerts(&self, filter: &AlertFilter) -> MonitorResult<Vec<Alert>> {
        let state = self.state.read().await;
        Ok(state
            .alerts
            .iter()
            .filter(|a| !a.resolved && filter.matches(a))
            .cloned()
            .collect())
    }

    async fn alerts_created_since(
        &self,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> MonitorResult<Vec<Alert>> {
        let state = self.state.read().await;
        Ok(state
            .alerts
            .iter()
            .filter(|a| a.alert_type == alert_type && a.created_at >= since)
            .cloned()
            .collect())
    }

    async fn mark_resolved(
        &self,
        alert_id: Uuid,
        resolver_id: &str,
        at: DateTime<Utc>,
        note: Option<&str>,
    ) -> MonitorResult<Alert> {
        let mut state = self.state.write().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| MonitorError::not_found("Alert", alert_id.to_string()))?;

        if !alert.resolved {
            alert.resolved = true;
            alert.resolved_by = Some(resolver_id.to_string());
            alert.resolved_at = Some(at);
            alert.resolution_note = note.map(str::to_string);
            alert.updated_at = at;
        }
        Ok(alert.clone())
    }

    async fn get_configuration(
        &self,
        alert_type: AlertType,
    ) -> MonitorResult<Option<AlertConfiguration>> {
        let state = self.state.read().await;
        Ok(state
            .configurations
            .iter()
            .find(|c| c.alert_type == alert_type)
            .cloned())
    }

    async fn insert_configuration_if_absent(
        &self,
        config: AlertConfiguration,
    ) -> MonitorResult<bool> {
        let mut state = self.state.write().await;
        if state
            .configurations
            .iter()
            .any(|c| c.alert_type == config.alert_type)
        {
            return Ok(false);
        }
        state.configurations.push(config);
        Ok(true)
    }

    async fn update_configuration(&self, config: &AlertConfiguration) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .configurations
            .iter_mut()
            .find(|c| c.alert_type == config.alert_type)
            .ok_or_else(|| MonitorError::not_found("Alert configuration", config.alert_type.as_str()))?;
        *slot = config.clone();
        Ok(())
    }

    async fn insert_person(&self, person: Person) -> MonitorResult<()> {
        let mut state = self.state.write().await;
        state.persons.insert(person.id.clone(), person);
        Ok(())
    }

    async fn persons_by_role(&self, role: Role) -> MonitorResult<Vec<Person>> {
        let state = self.state.read().await;
        Ok(state
            .persons
            .values()
            .filter(|p| p.role == role)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ActivityKind, AlertEvidence, AlertSeverity};
    use tempfile::TempDir;

    fn blocked_alert(task_id: &str) -> Alert {
        Alert::new(
            AlertEvidence::BlockedTask {
                task_title: "Order reagents".to_string(),
                blocked_since: Utc::now(),
                hours_blocked: 50,
            },
            AlertSeverity::High,
            "Blocked",
            "Blocked for 50 hours",
            Utc::now(),
        )
        .for_task(task_id)
    }

    #[tokio::test]
    async fn test_second_unresolved_alert_is_rejected() {
        let store = MemoryStore::new();
        store.insert_alert(blocked_alert("t-1")).await.unwrap();

        let err = store.insert_alert(blocked_alert("t-1")).await.unwrap_err();
        assert!(matches!(err, MonitorError::DuplicateAlert { .. }));

        // Different subject is fine
        store.insert_alert(blocked_alert("t-2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolved_alert_frees_the_key() {
        let store = MemoryStore::new();
        let alert = blocked_alert("t-1");
        let id = alert.id;
        store.insert_alert(alert).await.unwrap();
        store
            .mark_resolved(id, "sup-1", Utc::now(), Some("unblocked"))
            .await
            .unwrap();

        store.insert_alert(blocked_alert("t-1")).await.unwrap();
        let active = store.unresolved_alerts(&AlertFilter::default()).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_resolved_never_reopens_or_restamps() {
        let store = MemoryStore::new();
        let alert = blocked_alert("t-1");
        let id = alert.id;
        store.insert_alert(alert).await.unwrap();

        let first = store.mark_resolved(id, "sup-1", Utc::now(), None).await.unwrap();
        let second = store.mark_resolved(id, "sup-2", Utc::now(), None).await.unwrap();
        assert!(second.resolved);
        assert_eq!(second.resolved_by.as_deref(), Some("sup-1"));
        assert_eq!(first.resolved_at, second.resolved_at);
    }

    #[tokio::test]
    async fn test_configuration_insert_is_not_an_upsert() {
        let store = MemoryStore::new();
        let mut config = AlertConfiguration::default_for(AlertType::VelocityDrop);
        config.enabled = false;
        assert!(store.insert_configuration_if_absent(config).await.unwrap());

        let fresh = AlertConfiguration::default_for(AlertType::VelocityDrop);
        assert!(!store.insert_configuration_if_absent(fresh).await.unwrap());

        let stored = store
            .get_configuration(AlertType::VelocityDrop)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.enabled);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state").join("labwatch.json");

        let store = MemoryStore::new();
        store
            .insert_task(Task::new("t-1", "p-1", "Prepare samples"))
            .await
            .unwrap();
        store.insert_alert(blocked_alert("t-1")).await.unwrap();
        store.save(&path).await.unwrap();

        let reloaded = MemoryStore::load(&path).await.unwrap();
        assert!(reloaded.get_task("t-1").await.unwrap().is_some());
        assert_eq!(
            reloaded
                .unresolved_alerts(&AlertFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = MemoryStore::load(temp.path().join("absent.json")).await.unwrap();
        assert!(store.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_block_requires_schedule() {
        let store = MemoryStore::new();
        let block = ScheduleBlock::new("b-1", "missing", chrono::Weekday::Mon, "09:00", "10:00");
        assert!(matches!(
            store.insert_block(block).await,
            Err(MonitorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_task_update_and_activity_land_together() {
        let store = MemoryStore::new();
        let mut task = Task::new("t-1", "p-1", "Order reagents");
        store.insert_task(task.clone()).await.unwrap();

        task.status = TaskStatus::InProgress;
        let note = TaskActivity::new("t-1", "stu-1", ActivityKind::Status, "started", Utc::now());
        store.update_task_with_activity(&task, note).await.unwrap();
        assert_eq!(
            store.get_task("t-1").await.unwrap().unwrap().status,
            TaskStatus::InProgress
        );
        assert_eq!(store.activity_for_task("t-1").await.unwrap().len(), 1);

        let ghost = Task::new("t-9", "p-1", "Missing");
        let note = TaskActivity::new("t-9", "stu-1", ActivityKind::Status, "started", Utc::now());
        assert!(matches!(
            store.update_task_with_activity(&ghost, note).await,
            Err(MonitorError::NotFound { .. })
        ));
        assert!(store.activity_for_task("t-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_queries() {
        let store = MemoryStore::new();
        assert_eq!(store.storage_type(), "memory");

        let mut blocked = Task::new("t-1", "p-1", "Order reagents");
        blocked.status = TaskStatus::Blocked;
        blocked.assignees = vec!["stu-1".to_string(), "stu-2".to_string()];
        store.insert_task(blocked).await.unwrap();

        let mut other = Task::new("t-2", "p-2", "Write methods");
        other.assignees = vec!["stu-2".to_string()];
        store.insert_task(other).await.unwrap();

        assert_eq!(store.tasks_by_project("p-1").await.unwrap().len(), 1);
        assert_eq!(store.tasks_by_assignee("stu-2").await.unwrap().len(), 2);
        assert_eq!(store.tasks_by_assignee("stu-1").await.unwrap()[0].id, "t-1");
        assert_eq!(store.tasks_by_status(TaskStatus::Blocked).await.unwrap().len(), 1);
    }
}
