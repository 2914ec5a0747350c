use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::{self, RecurrenceRule};

/// Generates a `<prefix>_<16 hex chars>` identifier.
pub fn generate_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..16])
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

/// Eisenhower matrix quadrant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub quadrant: Option<Quadrant>,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Only template tasks carry a rule. Generated occurrences never do.
    #[serde(default, deserialize_with = "recurrence::deserialize_stored_rule")]
    pub recurrence: Option<RecurrenceRule>,
    /// Id of the template this occurrence was generated from.
    #[serde(default)]
    pub parent_task_id: Option<String>,
    pub created_at: NaiveDateTime,
    /// Local wall time. Set exactly while `status` is `Completed`.
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub pomodoro_count: u32,
    #[serde(default)]
    pub order: u32,
}

impl Task {
    pub fn new(title: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id: generate_id("task"),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            quadrant: None,
            category_id: String::new(),
            due_date: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            recurrence: None,
            parent_task_id: None,
            created_at,
            completed_at: None,
            pomodoro_count: 0,
            order: 0,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// A task with a rule and a due date to advance from.
    pub fn is_template(&self) -> bool {
        self.recurrence.is_some() && self.due_date.is_some()
    }

    /// Changes the status and keeps `completed_at` in step with it. An
    /// already completed task keeps its original completion time.
    pub fn set_status(&mut self, status: TaskStatus, now: NaiveDateTime) {
        self.status = status;
        if status == TaskStatus::Completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }
}

/// Criteria for [`crate::TodoService::find_tasks`]. Unset fields match
/// everything; `search` is a case-insensitive substring of the title or
/// description.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category_id: Option<String>,
    pub priority: Option<Priority>,
    pub quadrant: Option<Quadrant>,
    pub due_date: Option<NaiveDate>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if let Some(category_id) = &self.category_id {
            if &task.category_id != category_id {
                return false;
            }
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if self.quadrant.is_some() && task.quadrant != self.quadrant {
            return false;
        }
        if self.due_date.is_some() && task.due_date != self.due_date {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Edits to a task's descriptive fields; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    /// A blank title is ignored rather than applied.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            let title = title.trim();
            if !title.is_empty() {
                task.title = title.to_string();
            }
        }
        if let Some(description) = self.description {
            task.description = description.trim().to_string();
        }
        if let Some(category_id) = self.category_id {
            task.category_id = category_id;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroRecord {
    pub id: String,
    pub task_id: String,
    pub started_at: NaiveDateTime,
    #[serde(default)]
    pub ended_at: Option<NaiveDateTime>,
    /// Minutes.
    #[serde(default = "default_pomodoro_minutes")]
    pub duration: u32,
    #[serde(default)]
    pub completed: bool,
}

pub const DEFAULT_POMODORO_MINUTES: u32 = 25;

fn default_pomodoro_minutes() -> u32 {
    DEFAULT_POMODORO_MINUTES
}

impl PomodoroRecord {
    pub fn start(task_id: impl Into<String>, duration: u32, now: NaiveDateTime) -> Self {
        Self {
            id: generate_id("pomo"),
            task_id: task_id.into(),
            started_at: now,
            ended_at: None,
            duration,
            completed: false,
        }
    }

    pub fn finish(&mut self, completed: bool, now: NaiveDateTime) {
        self.ended_at = Some(now);
        self.completed = completed;
    }
}
