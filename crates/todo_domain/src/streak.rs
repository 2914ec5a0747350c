use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::task::Task;

/// Calendar dates on which at least one task was completed.
pub fn completion_dates<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> BTreeSet<NaiveDate> {
    tasks
        .into_iter()
        .filter(|task| task.is_completed())
        .filter_map(|task| task.completed_at.map(|at| at.date()))
        .collect()
}

/// Length of the run of consecutive completion days ending today.
///
/// A day without completions yet does not break the streak: counting then
/// starts from yesterday.
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if dates.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|day| dates.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
