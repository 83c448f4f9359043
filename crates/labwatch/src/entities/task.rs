//! Task entity and its activity trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "inprogress" | "in_progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!("invalid task status: '{s}'")),
        }
    }
}

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// One entry of a task checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// A unit of assigned work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: TaskStatus,

    /// Completion percentage, always within 0..=100
    #[serde(default)]
    pub progress: u8,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistItem>,

    /// Persons the task is assigned to
    #[serde(default)]
    pub assignees: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            due_at: None,
            status: TaskStatus::default(),
            progress: 0,
            priority: TaskPriority::default(),
            required: false,
            reminder_at: None,
            checklist: Vec::new(),
            assignees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Due date has passed and the work is not finished
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.due_at.is_some_and(|due| due < now)
    }

    /// Assign a status, keeping `completed` and `progress = 100` in lockstep.
    pub fn apply_status(&mut self, status: TaskStatus, at: DateTime<Utc>) {
        self.status = status;
        if status == TaskStatus::Completed {
            self.progress = 100;
        }
        self.updated_at = at;
    }

    /// Clamp and assign progress; reaching 100 completes the task and
    /// dropping below 100 reopens a completed one.
    pub fn apply_progress(&mut self, pct: i32, at: DateTime<Utc>) {
        self.progress = pct.clamp(0, 100) as u8;
        if self.progress == 100 {
            self.status = TaskStatus::Completed;
        } else if self.status == TaskStatus::Completed {
            self.status = TaskStatus::InProgress;
        }
        self.updated_at = at;
    }
}

/// Kind of a task activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Status,
    Progress,
    Comment,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Progress => "progress",
            Self::Comment => "comment",
        }
    }
}

/// Append-only record of a task mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskActivity {
    pub id: Uuid,
    pub task_id: String,
    pub actor_id: String,
    pub kind: ActivityKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl TaskActivity {
    pub fn new(
        task_id: impl Into<String>,
        actor_id: impl Into<String>,
        kind: ActivityKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.into(),
            actor_id: actor_id.into(),
            kind,
            message: message.into(),
            created_at,
        }
    }
}
