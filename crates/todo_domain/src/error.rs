/// Validation failures surfaced to the caller. Everything else is reported
/// as an empty result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("category name must not be empty")]
    EmptyCategoryName,

    #[error("task `{task_id}` needs a due date before it can recur")]
    MissingDueDate { task_id: String },

    #[error("task `{task_id}` recurs; clear the recurrence before removing its due date")]
    RecurrenceNeedsDueDate { task_id: String },
}

pub type Result<T> = std::result::Result<T, TodoError>;
