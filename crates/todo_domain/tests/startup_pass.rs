use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde_json::json;
use todo_domain::{
    clock::{Clock, FixedClock},
    notifications::{NotificationRequest, NotificationSink},
    service::NewTask,
    task::{Task, TaskStatus},
    TodoService,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, 0, 0).expect("valid time")
}

#[derive(Default, Clone)]
struct RecordingSink {
    scheduled: Arc<Mutex<Vec<NotificationRequest>>>,
    cleared: Arc<Mutex<Vec<String>>>,
}

impl NotificationSink for RecordingSink {
    fn schedule(&self, notification: NotificationRequest) {
        self.scheduled.lock().push(notification);
    }

    fn clear_for_task(&self, task: &Task) {
        self.cleared.lock().push(task.id.clone());
    }
}

struct SharedClock(Arc<FixedClock>);

impl Clock for SharedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.now()
    }
}

#[test]
fn startup_pass_generates_occurrences_then_unlocks_achievements() {
    let clock = Arc::new(FixedClock::new(at(date(2024, 1, 3), 8)));
    let sink = RecordingSink::default();
    let service = TodoService::builder()
        .with_clock(Box::new(SharedClock(clock.clone())))
        .with_notification_sink(Box::new(sink.clone()))
        .build();

    // Wednesday template repeating Mon/Wed/Fri.
    let template = service
        .add_task(NewTask::titled("Standup").due(date(2024, 1, 3)))
        .expect("add template");
    service
        .set_recurrence(
            &template.id,
            &json!({"type": "weekly", "interval": 1, "weekdays": [4, 0, 2]}),
        )
        .expect("set rule")
        .expect("template exists");

    let report = service.run_startup_pass();
    let created: Vec<_> = report.catch_up.created.iter().map(|t| t.due_date).collect();
    assert_eq!(created, vec![Some(date(2024, 1, 5))], "Friday follows Wednesday");
    assert!(report.unlocked.is_empty());

    let occurrence = &report.catch_up.created[0];
    service
        .update_status(&occurrence.id, TaskStatus::Completed)
        .expect("occurrence exists");

    let second = service.run_startup_pass();
    assert!(second.catch_up.is_empty(), "no time passed, nothing to generate");
    let unlocked: Vec<_> = second.unlocked.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(unlocked, vec!["task_1", "early_1"]);
    assert!(service.run_startup_pass().unlocked.is_empty());

    clock.set(at(date(2024, 1, 12), 12));
    let later = service.run_startup_pass();
    let created: Vec<_> = later.catch_up.created.iter().map(|t| t.due_date).collect();
    assert_eq!(
        created,
        vec![
            Some(date(2024, 1, 8)),
            Some(date(2024, 1, 10)),
            Some(date(2024, 1, 12)),
            Some(date(2024, 1, 15)),
        ]
    );
    let template = service.get_task(&template.id).expect("template kept");
    assert_eq!(template.due_date, Some(date(2024, 1, 15)));
    assert_eq!(template.recurrence.expect("rule kept").generated_count, 5);
    assert_eq!(service.occurrences_of(&template.id).len(), 5);

    let scheduled = sink.scheduled.lock();
    assert!(scheduled
        .iter()
        .any(|n| n.title == "Achievement unlocked: First Step"));
    assert_eq!(
        scheduled
            .iter()
            .filter(|n| n.title == "Recurring: Standup")
            .count(),
        5
    );
    drop(scheduled);

    assert!(service.delete_task(&template.id));
    assert_eq!(sink.cleared.lock().as_slice(), [template.id.clone()]);
}

#[test]
fn monthly_rule_on_the_31st_lands_on_leap_day() {
    let service = TodoService::builder()
        .with_clock(Box::new(FixedClock::new(at(date(2024, 1, 31), 10))))
        .build();
    let template = service
        .add_task(NewTask::titled("Pay rent").due(date(2024, 1, 31)))
        .expect("add template");
    service
        .set_recurrence(
            &template.id,
            &json!({"type": "monthly", "interval": 1, "month_day": 31}),
        )
        .expect("set rule");

    let report = service.generate_recurring();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].due_date, Some(date(2024, 2, 29)));
    assert_eq!(report.created[0].parent_task_id.as_deref(), Some(template.id.as_str()));
}

#[test]
fn count_limited_rule_stops_after_three_occurrences() {
    let clock = Arc::new(FixedClock::new(at(date(2024, 3, 1), 10)));
    let service = TodoService::builder()
        .with_clock(Box::new(SharedClock(clock.clone())))
        .build();
    let template = service
        .add_task(NewTask::titled("Vitamins").due(date(2024, 2, 27)))
        .expect("add template");
    service
        .set_recurrence(
            &template.id,
            &json!({"type": "daily", "end_type": "count", "end_count": "3"}),
        )
        .expect("set rule");

    assert_eq!(service.generate_recurring().created.len(), 3);
    clock.set(at(date(2024, 3, 20), 10));
    assert!(service.generate_recurring().created.is_empty());
    let template = service.get_task(&template.id).expect("template kept");
    assert!(template.due_date.expect("due date kept") <= date(2024, 3, 20));
}

#[test]
fn snapshot_survives_json_round_trip() {
    let service = TodoService::builder()
        .with_clock(Box::new(FixedClock::new(at(date(2024, 5, 1), 23))))
        .build();
    let task = service
        .add_task(NewTask::titled("Late work").due(date(2024, 5, 1)))
        .expect("add");
    service
        .set_recurrence(&task.id, &json!({"type": "yearly"}))
        .expect("rule");
    service.update_status(&task.id, TaskStatus::Completed);
    service.check_achievements();

    let encoded = serde_json::to_string(&service.export_snapshot()).expect("encode");
    let restored = TodoService::builder()
        .with_snapshot(serde_json::from_str(&encoded).expect("decode"))
        .build();
    assert_eq!(restored.export_snapshot(), service.export_snapshot());
    assert!(restored.achievements().is_unlocked("night_1"));
}
