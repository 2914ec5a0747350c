use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use todo_domain::{
    clock::{Clock, SystemClock},
    config::EngineConfig,
    notifications::{NotificationRequest, NotificationSink},
    service::{StartupReport, TodoSnapshot},
    task::Task,
    TodoService,
};
use tracing::{debug, info};

const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `TODO_DATA_DIR` overrides the data directory; naming something that
    /// exists but is not a directory is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup("TODO_DATA_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                let path = PathBuf::from(dir);
                if path.exists() && !path.is_dir() {
                    bail!("TODO_DATA_DIR `{}` is not a directory", path.display());
                }
                config.data_dir = path;
            }
        }
        config.engine = EngineConfig::from_lookup(lookup);
        Ok(config)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".todo_app");
        Self {
            data_dir,
            engine: EngineConfig::default(),
        }
    }
}

/// Writes scheduled reminders to the log; the engine has no delivery
/// channel of its own.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn schedule(&self, notification: NotificationRequest) {
        info!(
            title = %notification.title,
            at = %notification.scheduled_for,
            "{}",
            notification.body
        );
    }

    fn clear_for_task(&self, task: &Task) {
        debug!(task_id = %task.id, "reminders cleared");
    }
}

/// Loads the snapshot at `path`; a missing file is an empty workspace.
pub fn load_snapshot(path: &Path) -> Result<TodoSnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "no snapshot yet");
        return Ok(TodoSnapshot::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot `{}`", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing snapshot `{}`", path.display()))
}

/// Writes through a temporary sibling file so a crash never leaves a
/// half-written snapshot behind.
pub fn save_snapshot(path: &Path, snapshot: &TodoSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory `{}`", parent.display()))?;
        }
    }
    let payload = serde_json::to_string_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).with_context(|| format!("writing `{}`", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing `{}`", path.display()))?;
    Ok(())
}

pub fn run(config: AppConfig) -> Result<StartupReport> {
    run_with_clock(config, Box::new(SystemClock))
}

/// Loads the snapshot, runs the start-of-day pass and writes every task back,
/// including the templates whose due dates advanced.
pub fn run_with_clock(config: AppConfig, clock: Box<dyn Clock>) -> Result<StartupReport> {
    let path = config.snapshot_path();
    let snapshot = load_snapshot(&path)?;
    info!(
        path = %path.display(),
        tasks = snapshot.tasks.len(),
        pomodoros = snapshot.pomodoros.len(),
        "snapshot loaded"
    );

    let service = TodoService::builder()
        .with_config(config.engine.clone())
        .with_clock(clock)
        .with_snapshot(snapshot)
        .with_notification_sink(Box::new(LogNotificationSink))
        .build();
    let report = service.run_startup_pass();

    save_snapshot(&path, &service.export_snapshot())?;

    info!(
        created = report.catch_up.created.len(),
        advanced = report.catch_up.updated_templates.len(),
        unlocked = report.unlocked.len(),
        "startup pass finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_must_be_a_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "").expect("write");
        let file_name = file.display().to_string();
        let err = AppConfig::from_lookup(|key| {
            (key == "TODO_DATA_DIR").then(|| file_name.clone())
        })
        .unwrap_err();
        assert!(err.to_string().contains("is not a directory"));

        let dir_name = dir.path().display().to_string();
        let config = AppConfig::from_lookup(|key| match key {
            "TODO_DATA_DIR" => Some(dir_name.clone()),
            "TODO_REMINDER_HOUR" => Some("8".to_string()),
            _ => None,
        })
        .expect("config");
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.engine.reminder_hour, 8);
    }

    #[test]
    fn missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = load_snapshot(&dir.path().join("absent.json")).expect("load");
        assert!(snapshot.tasks.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SNAPSHOT_FILE);
        fs::write(&path, "{ not json").expect("write");
        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing snapshot"));
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SNAPSHOT_FILE);
        save_snapshot(&path, &TodoSnapshot::default()).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
