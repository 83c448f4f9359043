//! Task lifecycle: status, progress, checklist, reminder and review
//! mutations, each leaving one activity record behind.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{ActivityKind, ChecklistItem, Task, TaskActivity, TaskStatus};
use crate::errors::{MonitorError, MonitorResult};
use crate::storage::Store;

/// Review step applied to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Submit,
    Approve,
    Reject,
}

impl ReviewAction {
    /// Status the task lands in after this action
    pub fn target_status(self) -> TaskStatus {
        match self {
            Self::Submit => TaskStatus::InProgress,
            Self::Approve => TaskStatus::Completed,
            Self::Reject => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "submit" => Ok(Self::Submit),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(format!("Invalid review action: {s}")),
        }
    }
}

/// Task lifecycle facade over the store
pub struct TaskLifecycle {
    store: Arc<dyn Store>,
}

impl TaskLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Get a task by ID
    pub async fn get_task(&self, task_id: &str) -> MonitorResult<Task> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or_else(|| MonitorError::not_found("Task", task_id))
    }

    pub async fn activity(&self, task_id: &str) -> MonitorResult<Vec<TaskActivity>> {
        self.get_task(task_id).await?;
        self.store.activity_for_task(task_id).await
    }

    /// Assign any status; no transition is refused.
    pub async fn set_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        actor_id: &str,
        note: Option<&str>,
    ) -> MonitorResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let previous = task.status;
        let now = Utc::now();
        task.apply_status(status, now);

        let message = with_note(format!("Status changed from {previous} to {status}"), note);
        self.commit(&task, actor_id, ActivityKind::Status, message, now)
            .await?;
        Ok(task)
    }

    /// Clamp to 0..=100; reaching 100 also completes the task.
    pub async fn set_progress(
        &self,
        task_id: &str,
        pct: i32,
        actor_id: &str,
        note: Option<&str>,
    ) -> MonitorResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let now = Utc::now();
        task.apply_progress(pct, now);

        let mut message = format!("Progress updated to {}%", task.progress);
        if task.is_completed() {
            message.push_str(" (completed)");
        }
        let message = with_note(message, note);
        self.commit(&task, actor_id, ActivityKind::Progress, message, now)
            .await?;
        Ok(task)
    }

    /// Replace the checklist wholesale.
    pub async fn update_checklist(
        &self,
        task_id: &str,
        items: Vec<ChecklistItem>,
        actor_id: &str,
    ) -> MonitorResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let now = Utc::now();
        let done = items.iter().filter(|i| i.done).count();
        let message = format!("Checklist updated ({done}/{} items done)", items.len());
        task.checklist = items;
        task.updated_at = now;

        self.commit(&task, actor_id, ActivityKind::Comment, message, now)
            .await?;
        Ok(task)
    }

    /// Set or clear the due reminder.
    pub async fn set_reminder(
        &self,
        task_id: &str,
        remind_at: Option<DateTime<Utc>>,
        actor_id: &str,
    ) -> MonitorResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let now = Utc::now();
        task.reminder_at = remind_at;
        task.updated_at = now;

        let message = match remind_at {
            Some(at) => format!("Reminder set for {}", at.to_rfc3339()),
            None => "Reminder cleared".to_string(),
        };
        self.commit(&task, actor_id, ActivityKind::Comment, message, now)
            .await?;
        Ok(task)
    }

    pub async fn review(
        &self,
        task_id: &str,
        action: ReviewAction,
        actor_id: &str,
        note: Option<&str>,
    ) -> MonitorResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let now = Utc::now();
        task.apply_status(action.target_status(), now);

        let message = with_note(format!("Review {action}"), note);
        self.commit(&task, actor_id, ActivityKind::Status, message, now)
            .await?;
        Ok(task)
    }

    /// Record a comment; the task itself is left untouched.
    pub async fn add_comment(
        &self,
        task_id: &str,
        actor_id: &str,
        message: &str,
    ) -> MonitorResult<TaskActivity> {
        self.get_task(task_id).await?;
        let activity = TaskActivity::new(task_id, actor_id, ActivityKind::Comment, message, Utc::now());
        self.store.append_activity(activity.clone()).await?;
        Ok(activity)
    }

    async fn commit(
        &self,
        task: &Task,
        actor_id: &str,
        kind: ActivityKind,
        message: String,
        at: DateTime<Utc>,
    ) -> MonitorResult<()> {
        debug!(task = %task.id, actor = actor_id, kind = kind.as_str(), "{message}");
        let activity = TaskActivity::new(&task.id, actor_id, kind, message, at);
        self.store.update_task_with_activity(task, activity).await
    }
}

fn with_note(message: String, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{message}: {note}"),
        None => message,
    }
}
