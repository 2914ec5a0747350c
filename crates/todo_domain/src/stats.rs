use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{PomodoroRecord, Task, TaskStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub not_started_tasks: usize,
    /// Percentage rounded to one decimal.
    pub completion_rate: f64,
    pub pomodoro_count: usize,
    pub pomodoro_minutes: u32,
    pub pomodoro_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub tasks_created: usize,
    pub tasks_completed: usize,
    pub pomodoros: usize,
}

/// Totals over tasks created and pomodoros started within the inclusive
/// `range`, or over everything when `range` is `None`.
pub fn task_stats(
    tasks: &[Task],
    pomodoros: &[PomodoroRecord],
    range: Option<(NaiveDate, NaiveDate)>,
) -> TaskStats {
    let in_range = |date: NaiveDate| range.map_or(true, |(start, end)| start <= date && date <= end);

    let mut stats = TaskStats::default();
    for task in tasks.iter().filter(|task| in_range(task.created_at.date())) {
        stats.total_tasks += 1;
        match task.status {
            TaskStatus::Completed => stats.completed_tasks += 1,
            TaskStatus::InProgress => stats.in_progress_tasks += 1,
            TaskStatus::NotStarted => stats.not_started_tasks += 1,
        }
    }
    if stats.total_tasks > 0 {
        stats.completion_rate =
            round_tenth(stats.completed_tasks as f64 / stats.total_tasks as f64 * 100.0);
    }

    for pomodoro in pomodoros
        .iter()
        .filter(|p| p.completed && in_range(p.started_at.date()))
    {
        stats.pomodoro_count += 1;
        stats.pomodoro_minutes += pomodoro.duration;
    }
    stats.pomodoro_hours = round_tenth(f64::from(stats.pomodoro_minutes) / 60.0);
    stats
}

pub fn daily_stats(tasks: &[Task], pomodoros: &[PomodoroRecord], date: NaiveDate) -> DailyStats {
    DailyStats {
        date,
        tasks_created: tasks
            .iter()
            .filter(|task| task.created_at.date() == date)
            .count(),
        tasks_completed: tasks
            .iter()
            .filter(|task| task.completed_at.map(|at| at.date()) == Some(date))
            .count(),
        pomodoros: pomodoros
            .iter()
            .filter(|p| p.completed && p.started_at.date() == date)
            .count(),
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
