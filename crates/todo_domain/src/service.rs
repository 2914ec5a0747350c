use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    achievement::{self, AchievementProgress, AchievementRecord, UnlockedAchievement},
    category::{default_categories, Category, CategoryUpdate},
    clock::{Clock, SystemClock},
    config::EngineConfig,
    error::{Result, TodoError},
    notifications::{NotificationRequest, NotificationSink},
    occurrence::{self, CatchUpReport},
    recurrence::normalize_rule,
    stats::{self, DailyStats, TaskStats},
    task::{PomodoroRecord, Priority, Quadrant, Task, TaskFilter, TaskStatus, TaskUpdate},
};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the service owns, in the shape the persistence layer stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TodoSnapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub pomodoros: Vec<PomodoroRecord>,
    #[serde(default)]
    pub achievements: AchievementRecord,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub quadrant: Option<Quadrant>,
    pub category_id: String,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupReport {
    pub catch_up: CatchUpReport,
    pub unlocked: Vec<UnlockedAchievement>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub tasks: usize,
    pub categories: usize,
    pub pomodoros: usize,
    pub achievements: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStats {
    pub tasks: usize,
    pub categories: usize,
    pub pomodoros: usize,
}

pub struct TodoService {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    tasks: RwLock<Vec<Task>>,
    categories: RwLock<Vec<Category>>,
    pomodoros: RwLock<Vec<PomodoroRecord>>,
    achievements: RwLock<AchievementRecord>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

pub struct TodoServiceBuilder {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    pomodoros: Vec<PomodoroRecord>,
    achievements: AchievementRecord,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

impl Default for TodoServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: Box::new(SystemClock),
            tasks: Vec::new(),
            categories: Vec::new(),
            pomodoros: Vec::new(),
            achievements: AchievementRecord::default(),
            notification_sink: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Categories to start with. An empty list seeds the defaults on build.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_pomodoros(mut self, pomodoros: Vec<PomodoroRecord>) -> Self {
        self.pomodoros = pomodoros;
        self
    }

    pub fn with_achievements(mut self, achievements: AchievementRecord) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn with_snapshot(self, snapshot: TodoSnapshot) -> Self {
        self.with_tasks(snapshot.tasks)
            .with_categories(snapshot.categories)
            .with_pomodoros(snapshot.pomodoros)
            .with_achievements(snapshot.achievements)
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn build(self) -> TodoService {
        let categories = if self.categories.is_empty() {
            debug!("seeding default categories");
            default_categories()
        } else {
            self.categories
        };
        TodoService {
            config: self.config,
            clock: self.clock,
            tasks: RwLock::new(self.tasks),
            categories: RwLock::new(categories),
            pomodoros: RwLock::new(self.pomodoros),
            achievements: RwLock::new(self.achievements),
            notification_sink: self.notification_sink,
        }
    }
}

impl TodoService {
    pub fn builder() -> TodoServiceBuilder {
        TodoServiceBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    #[instrument(skip(self, new), fields(title = %new.title))]
    pub fn add_task(&self, new: NewTask) -> Result<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        let mut tasks = self.tasks.write();
        let order = tasks.iter().map(|task| task.order + 1).max().unwrap_or(0);

        let mut task = Task::new(title, self.now());
        task.description = new.description.trim().to_string();
        task.priority = new.priority;
        task.quadrant = new.quadrant;
        task.category_id = new.category_id;
        task.due_date = new.due_date;
        task.tags = new.tags;
        task.order = order;

        tasks.push(task.clone());
        debug!(task_id = %task.id, "task added");
        Ok(task)
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.tasks.read().iter().find(|task| task.id == id).cloned()
    }

    /// All tasks sorted by their display order.
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks = self.tasks.read().clone();
        tasks.sort_by_key(|task| task.order);
        tasks
    }

    /// Tasks matching `filter`, sorted by display order.
    pub fn find_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.order);
        tasks
    }

    pub fn tasks_due_on(&self, date: NaiveDate) -> Vec<Task> {
        self.find_tasks(&TaskFilter {
            due_date: Some(date),
            ..TaskFilter::default()
        })
    }

    pub fn today_tasks(&self) -> Vec<Task> {
        self.tasks_due_on(self.today())
    }

    /// Tasks due within the inclusive range, earliest first. Undated tasks
    /// never match.
    pub fn tasks_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|task| task.due_date.is_some_and(|due| start <= due && due <= end))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.due_date, task.order));
        tasks
    }

    /// Gives each listed task its position in `ids` as display order.
    /// Unknown ids are skipped. Returns how many tasks were reordered.
    pub fn reorder_tasks<S: AsRef<str>>(&self, ids: &[S]) -> usize {
        let mut tasks = self.tasks.write();
        let mut moved = 0;
        for (position, id) in (0u32..).zip(ids) {
            if let Some(task) = tasks.iter_mut().find(|task| task.id == id.as_ref()) {
                task.order = position;
                moved += 1;
            }
        }
        moved
    }

    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Option<Task> {
        self.modify_task(id, |task| update.apply(task))
    }

    pub fn update_priority(&self, id: &str, priority: Priority) -> Option<Task> {
        self.modify_task(id, |task| task.priority = priority)
    }

    pub fn update_quadrant(&self, id: &str, quadrant: Option<Quadrant>) -> Option<Task> {
        self.modify_task(id, |task| task.quadrant = quadrant)
    }

    /// Occurrences generated from `template_id`, oldest due date first.
    pub fn occurrences_of(&self, template_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|task| task.parent_task_id.as_deref() == Some(template_id))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.due_date);
        tasks
    }

    pub fn update_status(&self, id: &str, status: TaskStatus) -> Option<Task> {
        let now = self.now();
        self.modify_task(id, |task| task.set_status(status, now))
    }

    /// Moves or clears a due date. A recurring task cannot lose its due date
    /// while the rule is still set.
    pub fn set_due_date(&self, id: &str, due_date: Option<NaiveDate>) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        if due_date.is_none() && task.recurrence.is_some() {
            return Err(TodoError::RecurrenceNeedsDueDate {
                task_id: id.to_string(),
            });
        }
        task.due_date = due_date;
        Ok(Some(task.clone()))
    }

    pub fn delete_task(&self, id: &str) -> bool {
        let removed = {
            let mut tasks = self.tasks.write();
            let Some(position) = tasks.iter().position(|task| task.id == id) else {
                return false;
            };
            tasks.remove(position)
        };
        self.pomodoros.write().retain(|record| record.task_id != id);
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_task(&removed);
        }
        true
    }

    /// Defines or replaces the rule on a task from loosely-typed input.
    ///
    /// Input that does not describe a recurrence clears the rule. A rule can
    /// only be set on a task that has a due date.
    #[instrument(skip(self, raw))]
    pub fn set_recurrence(&self, id: &str, raw: &Value) -> Result<Option<Task>> {
        let rule = normalize_rule(raw);
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        if rule.is_some() && task.due_date.is_none() {
            return Err(TodoError::MissingDueDate {
                task_id: id.to_string(),
            });
        }
        task.recurrence = rule;
        Ok(Some(task.clone()))
    }

    pub fn clear_recurrence(&self, id: &str) -> Option<Task> {
        self.modify_task(id, |task| task.recurrence = None)
    }

    pub fn add_category(
        &self,
        name: &str,
        icon: Option<&str>,
        color: Option<&str>,
    ) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TodoError::EmptyCategoryName);
        }
        let mut categories = self.categories.write();
        let order = categories.iter().map(|c| c.order + 1).max().unwrap_or(0);
        let mut category = Category::new(name, order);
        if let Some(icon) = icon {
            category.icon = icon.to_string();
        }
        if let Some(color) = color {
            category.color = color.to_string();
        }
        categories.push(category.clone());
        debug!(category_id = %category.id, "category added");
        Ok(category)
    }

    pub fn get_category(&self, id: &str) -> Option<Category> {
        self.categories.read().iter().find(|c| c.id == id).cloned()
    }

    /// All categories sorted by their display order.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories = self.categories.read().clone();
        categories.sort_by_key(|c| c.order);
        categories
    }

    pub fn update_category(&self, id: &str, update: CategoryUpdate) -> Option<Category> {
        let mut categories = self.categories.write();
        let category = categories.iter_mut().find(|c| c.id == id)?;
        update.apply(category);
        Some(category.clone())
    }

    /// Removes a category and detaches every task filed under it.
    pub fn delete_category(&self, id: &str) -> bool {
        let mut tasks = self.tasks.write();
        let mut categories = self.categories.write();
        let Some(position) = categories.iter().position(|c| c.id == id) else {
            return false;
        };
        categories.remove(position);
        for task in tasks.iter_mut().filter(|task| task.category_id == id) {
            task.category_id.clear();
        }
        true
    }

    pub fn start_pomodoro(&self, task_id: &str, duration: u32) -> Option<PomodoroRecord> {
        if self.get_task(task_id).is_none() {
            return None;
        }
        let record = PomodoroRecord::start(task_id, duration, self.now());
        self.pomodoros.write().push(record.clone());
        Some(record)
    }

    /// Marks a session finished and credits it to its task.
    pub fn complete_pomodoro(&self, id: &str) -> Option<PomodoroRecord> {
        let now = self.now();
        let record = {
            let mut pomodoros = self.pomodoros.write();
            let record = pomodoros.iter_mut().find(|record| record.id == id)?;
            record.finish(true, now);
            record.clone()
        };
        self.modify_task(&record.task_id, |task| task.pomodoro_count += 1);
        Some(record)
    }

    pub fn cancel_pomodoro(&self, id: &str) -> bool {
        let now = self.now();
        let mut pomodoros = self.pomodoros.write();
        match pomodoros.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.finish(false, now);
                true
            }
            None => false,
        }
    }

    pub fn pomodoros_for_task(&self, task_id: &str) -> Vec<PomodoroRecord> {
        self.pomodoros
            .read()
            .iter()
            .filter(|record| record.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Every session started on `date`, finished or not.
    pub fn pomodoros_on(&self, date: NaiveDate) -> Vec<PomodoroRecord> {
        self.pomodoros
            .read()
            .iter()
            .filter(|record| record.started_at.date() == date)
            .cloned()
            .collect()
    }

    /// Completed sessions started today.
    pub fn today_pomodoro_count(&self) -> usize {
        let today = self.today();
        self.pomodoros
            .read()
            .iter()
            .filter(|record| record.completed && record.started_at.date() == today)
            .count()
    }

    /// Generates every overdue occurrence and advances the templates in place.
    #[instrument(skip(self))]
    pub fn generate_recurring(&self) -> CatchUpReport {
        let now = self.now();
        let report = {
            let mut tasks = self.tasks.write();
            let report = occurrence::catch_up(&tasks, now, self.config.catch_up_cap);
            report.apply_to(&mut tasks);
            report
        };
        if !report.is_empty() {
            info!(
                templates = report.updated_templates.len(),
                created = report.created.len(),
                "recurring tasks generated"
            );
        }
        if let Some(sink) = &self.notification_sink {
            let hour = self.config.reminder_hour;
            for request in report
                .created
                .iter()
                .filter_map(|task| NotificationRequest::for_occurrence(task, hour))
            {
                sink.schedule(request);
            }
        }
        report
    }

    pub fn achievement_progress(&self) -> AchievementProgress {
        let tasks = self.tasks.read();
        let pomodoros = self.pomodoros.read();
        AchievementProgress::compute(&tasks, &pomodoros, self.today(), &self.config)
    }

    pub fn achievements(&self) -> AchievementRecord {
        self.achievements.read().clone()
    }

    /// Re-reads the whole history and records achievements reached since the
    /// last check.
    #[instrument(skip(self))]
    pub fn check_achievements(&self) -> Vec<UnlockedAchievement> {
        let now = self.now();
        let unlocks = {
            let tasks = self.tasks.read();
            let pomodoros = self.pomodoros.read();
            let mut record = self.achievements.write();
            achievement::check_achievements(&mut record, &tasks, &pomodoros, now, &self.config)
        };
        for unlock in &unlocks {
            info!(id = %unlock.id, tier = ?unlock.tier, "achievement unlocked");
        }
        if let Some(sink) = &self.notification_sink {
            for unlock in &unlocks {
                sink.schedule(NotificationRequest::for_unlock(unlock));
            }
        }
        unlocks
    }

    /// Catch-up scan followed by an achievement check, as run on start.
    pub fn run_startup_pass(&self) -> StartupReport {
        let catch_up = self.generate_recurring();
        let unlocked = self.check_achievements();
        StartupReport { catch_up, unlocked }
    }

    pub fn stats(&self, range: Option<(NaiveDate, NaiveDate)>) -> TaskStats {
        stats::task_stats(&self.tasks.read(), &self.pomodoros.read(), range)
    }

    pub fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        stats::daily_stats(&self.tasks.read(), &self.pomodoros.read(), date)
    }

    pub fn data_stats(&self) -> DataStats {
        DataStats {
            tasks: self.tasks.read().len(),
            categories: self.categories.read().len(),
            pomodoros: self.pomodoros.read().len(),
        }
    }

    pub fn export_snapshot(&self) -> TodoSnapshot {
        TodoSnapshot {
            version: SNAPSHOT_VERSION,
            tasks: self.tasks.read().clone(),
            categories: self.categories.read().clone(),
            pomodoros: self.pomodoros.read().clone(),
            achievements: self.achievements.read().clone(),
        }
    }

    /// Replaces all state with `snapshot`. A snapshot without categories
    /// keeps the current ones.
    pub fn import_snapshot(&self, snapshot: TodoSnapshot) -> ImportSummary {
        let summary = ImportSummary {
            tasks: snapshot.tasks.len(),
            categories: snapshot.categories.len(),
            pomodoros: snapshot.pomodoros.len(),
            achievements: snapshot.achievements.unlocked.len(),
        };
        *self.tasks.write() = snapshot.tasks;
        if !snapshot.categories.is_empty() {
            *self.categories.write() = snapshot.categories;
        }
        *self.pomodoros.write() = snapshot.pomodoros;
        *self.achievements.write() = snapshot.achievements;
        debug!(?summary, "snapshot imported");
        summary
    }
}

impl TodoService {
    fn modify_task(&self, id: &str, change: impl FnOnce(&mut Task)) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks.iter_mut().find(|task| task.id == id)?;
        change(task);
        Some(task.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn service_at(now: NaiveDateTime) -> TodoService {
        TodoService::builder()
            .with_clock(Box::new(FixedClock::new(now)))
            .build()
    }

    #[test]
    fn add_task_validates_and_orders() {
        let service = service_at(at(2024, 1, 1, 9));
        assert_eq!(
            service.add_task(NewTask::titled("   ")),
            Err(TodoError::EmptyTitle)
        );
        let first = service.add_task(NewTask::titled("  First ")).unwrap();
        let second = service.add_task(NewTask::titled("Second")).unwrap();
        assert_eq!(first.title, "First");
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
        assert_eq!(service.tasks().len(), 2);
    }

    #[test]
    fn set_recurrence_requires_due_date() {
        let service = service_at(at(2024, 1, 1, 9));
        let task = service.add_task(NewTask::titled("Gym")).unwrap();
        let err = service
            .set_recurrence(&task.id, &json!({"type": "daily"}))
            .unwrap_err();
        assert_eq!(
            err,
            TodoError::MissingDueDate {
                task_id: task.id.clone()
            }
        );
        assert_eq!(
            service.set_recurrence("task_missing", &json!({"type": "daily"})),
            Ok(None)
        );
    }

    #[test]
    fn set_recurrence_resets_generated_count() {
        let service = service_at(at(2024, 1, 5, 9));
        let task = service
            .add_task(NewTask::titled("Gym").due(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .unwrap();
        service
            .set_recurrence(&task.id, &json!({"type": "daily"}))
            .unwrap();
        service.generate_recurring();
        let advanced = service.get_task(&task.id).unwrap();
        assert!(advanced.recurrence.as_ref().unwrap().generated_count > 0);

        let replaced = service
            .set_recurrence(&task.id, &json!({"type": "weekly", "generated_count": 9}))
            .unwrap()
            .unwrap();
        assert_eq!(replaced.recurrence.unwrap().generated_count, 0);
    }

    #[test]
    fn recurring_task_keeps_its_due_date() {
        let service = service_at(at(2024, 1, 1, 9));
        let task = service
            .add_task(NewTask::titled("Gym").due(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .unwrap();
        service
            .set_recurrence(&task.id, &json!({"type": "daily"}))
            .unwrap();
        assert!(matches!(
            service.set_due_date(&task.id, None),
            Err(TodoError::RecurrenceNeedsDueDate { .. })
        ));
        service.clear_recurrence(&task.id).unwrap();
        let cleared = service.set_due_date(&task.id, None).unwrap().unwrap();
        assert_eq!(cleared.due_date, None);
    }

    #[test]
    fn status_changes_maintain_completed_at() {
        let now = at(2024, 1, 1, 9);
        let service = service_at(now);
        let task = service.add_task(NewTask::titled("Read")).unwrap();
        let done = service.update_status(&task.id, TaskStatus::Completed).unwrap();
        assert_eq!(done.completed_at, Some(now));
        let reopened = service.update_status(&task.id, TaskStatus::NotStarted).unwrap();
        assert_eq!(reopened.completed_at, None);
        assert!(service.update_status("nope", TaskStatus::Completed).is_none());
    }

    #[test]
    fn pomodoro_lifecycle_updates_task_and_cascades_on_delete() {
        let service = service_at(at(2024, 1, 1, 9));
        let task = service.add_task(NewTask::titled("Focus")).unwrap();
        assert!(service.start_pomodoro("missing", 25).is_none());

        let session = service.start_pomodoro(&task.id, 25).unwrap();
        let finished = service.complete_pomodoro(&session.id).unwrap();
        assert!(finished.completed);
        assert_eq!(service.get_task(&task.id).unwrap().pomodoro_count, 1);

        let other = service.start_pomodoro(&task.id, 25).unwrap();
        assert!(service.cancel_pomodoro(&other.id));
        assert!(!service.cancel_pomodoro("pomo_missing"));
        assert_eq!(service.pomodoros_for_task(&task.id).len(), 2);

        assert!(service.delete_task(&task.id));
        assert!(service.pomodoros_for_task(&task.id).is_empty());
        assert!(!service.delete_task(&task.id));
    }

    #[test]
    fn queries_filter_and_order_tasks() {
        let service = service_at(at(2024, 1, 10, 9));
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let report = service
            .add_task(NewTask {
                priority: Priority::High,
                ..NewTask::titled("Quarterly report").due(day(12))
            })
            .unwrap();
        let groceries = service
            .add_task(NewTask::titled("Groceries").due(day(10)))
            .unwrap();
        let someday = service.add_task(NewTask::titled("Learn piano")).unwrap();

        let high = service.find_tasks(&TaskFilter {
            priority: Some(Priority::High),
            ..TaskFilter::default()
        });
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, report.id);

        let today: Vec<_> = service.today_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(today, vec![groceries.id.clone()]);

        let window: Vec<_> = service
            .tasks_between(day(9), day(12))
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(window, vec![groceries.id.clone(), report.id.clone()]);

        let order = [someday.id.as_str(), "task_missing", report.id.as_str()];
        assert_eq!(service.reorder_tasks(&order), 2);
        let ordered: Vec<_> = service.tasks().into_iter().map(|t| t.title).collect();
        assert_eq!(ordered, vec!["Learn piano", "Groceries", "Quarterly report"]);
    }

    #[test]
    fn field_updates_touch_only_their_field() {
        let service = service_at(at(2024, 1, 1, 9));
        let task = service.add_task(NewTask::titled("Draft")).unwrap();

        let renamed = service
            .update_task(
                &task.id,
                TaskUpdate {
                    title: Some("Final draft".into()),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.title, "Final draft");
        assert_eq!(renamed.priority, Priority::Medium);

        let urgent = service.update_priority(&task.id, Priority::Urgent).unwrap();
        assert_eq!(urgent.priority, Priority::Urgent);
        let placed = service.update_quadrant(&task.id, Some(Quadrant::Q2)).unwrap();
        assert_eq!(placed.quadrant, Some(Quadrant::Q2));
        assert_eq!(placed.title, "Final draft");
        assert!(service.update_priority("nope", Priority::Low).is_none());
    }

    #[test]
    fn categories_are_seeded_and_detached_on_delete() {
        let service = service_at(at(2024, 1, 1, 9));
        let seeded = service.categories();
        assert_eq!(seeded.len(), 4);
        assert_eq!(seeded[0].name, "Work");

        assert_eq!(
            service.add_category(" ", None, None),
            Err(TodoError::EmptyCategoryName)
        );
        let hobby = service.add_category("Hobby", Some("🎸"), None).unwrap();
        assert_eq!(hobby.order, 4);
        let renamed = service
            .update_category(
                &hobby.id,
                CategoryUpdate {
                    name: Some("Music".into()),
                    ..CategoryUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Music");
        assert_eq!(renamed.icon, "🎸");

        let task = service
            .add_task(NewTask {
                category_id: hobby.id.clone(),
                ..NewTask::titled("Practice scales")
            })
            .unwrap();
        assert!(service.delete_category(&hobby.id));
        assert!(!service.delete_category(&hobby.id));
        assert!(service.get_category(&hobby.id).is_none());
        assert_eq!(service.get_task(&task.id).unwrap().category_id, "");
        assert_eq!(service.data_stats().categories, 4);
    }

    #[test]
    fn pomodoros_by_day() {
        let clock = std::sync::Arc::new(FixedClock::new(at(2024, 1, 1, 9)));
        struct Shared(std::sync::Arc<FixedClock>);
        impl Clock for Shared {
            fn now(&self) -> NaiveDateTime {
                self.0.now()
            }
        }
        let service = TodoService::builder()
            .with_clock(Box::new(Shared(clock.clone())))
            .build();
        let task = service.add_task(NewTask::titled("Focus")).unwrap();

        let yesterday = service.start_pomodoro(&task.id, 25).unwrap();
        service.complete_pomodoro(&yesterday.id).unwrap();
        clock.set(at(2024, 1, 2, 9));
        let done = service.start_pomodoro(&task.id, 25).unwrap();
        service.complete_pomodoro(&done.id).unwrap();
        service.start_pomodoro(&task.id, 25).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(service.pomodoros_on(day).len(), 2);
        assert_eq!(service.today_pomodoro_count(), 1);
        assert_eq!(
            service.data_stats(),
            DataStats {
                tasks: 1,
                categories: 4,
                pomodoros: 3,
            }
        );
    }

    #[test]
    fn snapshot_import_replaces_state() {
        let service = service_at(at(2024, 1, 1, 9));
        service.add_task(NewTask::titled("Keep")).unwrap();
        let snapshot = service.export_snapshot();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);

        let other = service_at(at(2024, 1, 1, 9));
        other.add_task(NewTask::titled("Dropped")).unwrap();
        let categories = snapshot.categories.clone();
        let summary = other.import_snapshot(snapshot);
        assert_eq!(summary.tasks, 1);
        assert_eq!(summary.categories, 4);
        assert_eq!(other.tasks()[0].title, "Keep");
        assert_eq!(other.categories(), categories);

        let before = other.categories();
        other.import_snapshot(TodoSnapshot::default());
        assert_eq!(other.categories(), before, "empty import keeps categories");
    }
}
