//! Catch-up generation of recurring task occurrences.
//!
//! The scan never mutates its input. It hands back the advanced templates and
//! the new occurrences so the caller decides when both are persisted.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::recurrence::next_occurrence;
use crate::task::{generate_id, Task, TaskStatus};

pub const DEFAULT_CATCH_UP_CAP: usize = 100;

/// `(parent_task_id, due_date)` pairs that already have an occurrence, plus
/// the next free display order.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceIndex {
    seen: HashSet<(String, NaiveDate)>,
    next_order: u32,
}

impl OccurrenceIndex {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut index = Self::default();
        for task in tasks {
            index.insert(task);
        }
        index
    }

    pub fn contains(&self, parent_id: &str, due_date: NaiveDate) -> bool {
        self.seen.contains(&(parent_id.to_string(), due_date))
    }

    pub fn insert(&mut self, task: &Task) {
        self.next_order = self.next_order.max(task.order.saturating_add(1));
        if let (Some(parent), Some(due)) = (&task.parent_task_id, task.due_date) {
            self.seen.insert((parent.clone(), due));
        }
    }

    /// Reserves the order slot after every task seen so far.
    pub fn claim_order(&mut self) -> u32 {
        let order = self.next_order;
        self.next_order = order.saturating_add(1);
        order
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The template with its due date and generated count advanced.
    pub template: Task,
    pub occurrences: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatchUpReport {
    pub updated_templates: Vec<Task>,
    pub created: Vec<Task>,
}

impl CatchUpReport {
    pub fn is_empty(&self) -> bool {
        self.updated_templates.is_empty() && self.created.is_empty()
    }

    /// Overwrites the advanced templates in `tasks` and appends the new
    /// occurrences after them.
    pub fn apply_to(&self, tasks: &mut Vec<Task>) {
        for updated in &self.updated_templates {
            if let Some(slot) = tasks.iter_mut().find(|task| task.id == updated.id) {
                *slot = updated.clone();
            }
        }
        tasks.extend(self.created.iter().cloned());
    }
}

/// Builds the occurrence of `template` due on `due_date`, placed at `order`.
///
/// Descriptive fields are copied, everything tracking progress starts fresh.
pub fn materialize(
    template: &Task,
    due_date: NaiveDate,
    now: NaiveDateTime,
    order: u32,
) -> Task {
    Task {
        id: generate_id("task"),
        title: template.title.clone(),
        description: template.description.clone(),
        status: TaskStatus::NotStarted,
        priority: template.priority,
        quadrant: template.quadrant,
        category_id: template.category_id.clone(),
        due_date: Some(due_date),
        tags: template.tags.clone(),
        subtasks: Vec::new(),
        recurrence: None,
        parent_task_id: Some(template.id.clone()),
        created_at: now,
        completed_at: None,
        pomodoro_count: 0,
        order,
    }
}

/// Generates every occurrence of `template` that is due as of `now`.
///
/// Stops when the template's due date passes today, the rule's end condition
/// refuses the next date, no next date exists, or `cap` iterations ran.
/// Dates already present in `index` advance the template without creating a
/// task or counting towards the rule's end. Returns `None` when the template
/// is left untouched.
pub fn generate_occurrences(
    template: &Task,
    index: &mut OccurrenceIndex,
    now: NaiveDateTime,
    cap: usize,
) -> Option<Generation> {
    let today = now.date();
    let mut updated = template.clone();
    let mut occurrences = Vec::new();
    let mut advanced = false;

    for iteration in 0..cap {
        let Some(current) = updated.due_date else {
            break;
        };
        let Some(rule) = updated.recurrence.as_mut() else {
            break;
        };
        if current > today {
            break;
        }
        let Some(next) = next_occurrence(current, rule) else {
            debug!(task_id = %template.id, %current, "recurrence produced no next date");
            break;
        };
        if !rule.end.permits(next, rule.generated_count) {
            debug!(task_id = %template.id, %next, "recurrence reached its end");
            break;
        }

        if index.contains(&template.id, next) {
            debug!(task_id = %template.id, %next, "occurrence already exists");
        } else {
            let occurrence = materialize(template, next, now, index.claim_order());
            index.insert(&occurrence);
            occurrences.push(occurrence);
            rule.generated_count += 1;
        }
        updated.due_date = Some(next);
        advanced = true;

        if iteration + 1 == cap {
            warn!(task_id = %template.id, cap, "catch-up cap reached");
        }
    }

    advanced.then_some(Generation {
        template: updated,
        occurrences,
    })
}

/// Runs [`generate_occurrences`] for every template in `tasks`.
pub fn catch_up(tasks: &[Task], now: NaiveDateTime, cap: usize) -> CatchUpReport {
    let mut index = OccurrenceIndex::from_tasks(tasks);
    let mut report = CatchUpReport::default();
    for template in tasks.iter().filter(|task| task.is_template()) {
        if let Some(generation) = generate_occurrences(template, &mut index, now, cap) {
            report.created.extend(generation.occurrences);
            report.updated_templates.push(generation.template);
        }
    }
    report
}
