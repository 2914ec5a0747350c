use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{achievement::UnlockedAchievement, task::Task};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub scheduled_for: NaiveDateTime,
}

impl NotificationRequest {
    pub fn for_unlock(unlock: &UnlockedAchievement) -> Self {
        let description = crate::achievement::definition(&unlock.id)
            .map(|def| format!("{} {}", def.icon, def.description))
            .unwrap_or_default();
        Self {
            title: format!("Achievement unlocked: {}", unlock.name),
            body: description,
            scheduled_for: unlock.unlocked_at,
        }
    }

    /// Reminder for a generated occurrence at `reminder_hour` on its due date.
    pub fn for_occurrence(occurrence: &Task, reminder_hour: u32) -> Option<Self> {
        let due = occurrence.due_date?;
        Some(Self {
            title: format!("Recurring: {}", occurrence.title),
            body: format!("Due on {}", due),
            scheduled_for: due.and_hms_opt(reminder_hour, 0, 0)?,
        })
    }
}

/// Receives reminders from [`crate::TodoService`]. Scheduling is
/// fire-and-forget; a sink that cannot deliver drops the request.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
    fn clear_for_task(&self, task: &Task);
}
