use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::streak::{completion_dates, current_streak};
use crate::task::{PomodoroRecord, Task};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Task,
    Pomodoro,
    Streak,
    Early,
    Night,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub tier: Tier,
    pub category: AchievementCategory,
    pub target: u32,
}

const fn achievement(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    tier: Tier,
    category: AchievementCategory,
    target: u32,
) -> AchievementDefinition {
    AchievementDefinition {
        id,
        name,
        description,
        icon,
        tier,
        category,
        target,
    }
}

use self::AchievementCategory as C;

#[rustfmt::skip]
pub const ACHIEVEMENTS: &[AchievementDefinition] = &[
    achievement("task_1", "First Step", "Complete your first task", "🌱", Tier::Bronze, C::Task, 1),
    achievement("task_10", "Getting Things Done", "Complete 10 tasks", "✅", Tier::Bronze, C::Task, 10),
    achievement("task_50", "Taskmaster", "Complete 50 tasks", "🏅", Tier::Silver, C::Task, 50),
    achievement("task_100", "Centurion", "Complete 100 tasks", "🏆", Tier::Gold, C::Task, 100),
    achievement("task_500", "Unstoppable", "Complete 500 tasks", "💎", Tier::Diamond, C::Task, 500),
    achievement("pomodoro_1", "First Tomato", "Finish a focus session", "🍅", Tier::Bronze, C::Pomodoro, 1),
    achievement("pomodoro_25", "Deep Focus", "Finish 25 focus sessions", "🎯", Tier::Silver, C::Pomodoro, 25),
    achievement("pomodoro_100", "Focus Engine", "Finish 100 focus sessions", "🔥", Tier::Gold, C::Pomodoro, 100),
    achievement("pomodoro_500", "Zen Master", "Finish 500 focus sessions", "🧘", Tier::Diamond, C::Pomodoro, 500),
    achievement("streak_3", "Warming Up", "Complete tasks 3 days in a row", "📅", Tier::Bronze, C::Streak, 3),
    achievement("streak_7", "Full Week", "Complete tasks 7 days in a row", "🗓️", Tier::Silver, C::Streak, 7),
    achievement("streak_30", "Habit Formed", "Complete tasks 30 days in a row", "⚡", Tier::Gold, C::Streak, 30),
    achievement("streak_100", "Iron Will", "Complete tasks 100 days in a row", "👑", Tier::Diamond, C::Streak, 100),
    achievement("early_1", "Early Bird", "Complete a task before 9am", "🐦", Tier::Bronze, C::Early, 1),
    achievement("early_10", "Morning Person", "Complete 10 tasks before 9am", "🌅", Tier::Silver, C::Early, 10),
    achievement("early_50", "Dawn Patrol", "Complete 50 tasks before 9am", "☀️", Tier::Gold, C::Early, 50),
    achievement("night_1", "Night Owl", "Complete a task after 10pm", "🦉", Tier::Bronze, C::Night, 1),
    achievement("night_10", "Midnight Oil", "Complete 10 tasks after 10pm", "🌙", Tier::Silver, C::Night, 10),
    achievement("night_50", "Nocturnal", "Complete 50 tasks after 10pm", "🌌", Tier::Gold, C::Night, 50),
];

pub fn definition(id: &str) -> Option<&'static AchievementDefinition> {
    ACHIEVEMENTS.iter().find(|def| def.id == id)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub last_date: Option<NaiveDate>,
}

/// Persisted unlock state. Entries in `unlocked` are never removed or
/// overwritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementRecord {
    #[serde(default)]
    pub unlocked: BTreeMap<String, NaiveDateTime>,
    #[serde(default)]
    pub streak: StreakState,
}

impl AchievementRecord {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }

    pub fn merge(&mut self, unlocks: &[UnlockedAchievement]) {
        for unlock in unlocks {
            self.unlocked
                .entry(unlock.id.clone())
                .or_insert(unlock.unlocked_at);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnlockedAchievement {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    pub unlocked_at: NaiveDateTime,
}

/// Counters derived from the full task and pomodoro history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementProgress {
    pub completed_tasks: u32,
    pub completed_pomodoros: u32,
    pub streak: u32,
    pub early_completions: u32,
    pub night_completions: u32,
    pub last_completion: Option<NaiveDate>,
}

impl AchievementProgress {
    pub fn compute(
        tasks: &[Task],
        pomodoros: &[PomodoroRecord],
        today: NaiveDate,
        config: &EngineConfig,
    ) -> Self {
        let mut progress = Self::default();
        for completed_at in tasks
            .iter()
            .filter(|task| task.is_completed())
            .filter_map(|task| task.completed_at)
        {
            progress.completed_tasks += 1;
            let hour = completed_at.hour();
            if hour < config.early_before_hour {
                progress.early_completions += 1;
            }
            if hour >= config.night_from_hour {
                progress.night_completions += 1;
            }
        }
        progress.completed_pomodoros = pomodoros.iter().filter(|p| p.completed).count() as u32;

        let dates = completion_dates(tasks);
        progress.streak = current_streak(&dates, today);
        progress.last_completion = dates.last().copied();
        progress
    }

    pub fn value_for(&self, category: AchievementCategory) -> u32 {
        match category {
            AchievementCategory::Task => self.completed_tasks,
            AchievementCategory::Pomodoro => self.completed_pomodoros,
            AchievementCategory::Streak => self.streak,
            AchievementCategory::Early => self.early_completions,
            AchievementCategory::Night => self.night_completions,
        }
    }
}

/// Definitions whose threshold `progress` meets but `record` has not
/// unlocked yet, stamped with `now`.
pub fn detect_unlocks(
    progress: &AchievementProgress,
    record: &AchievementRecord,
    now: NaiveDateTime,
) -> Vec<UnlockedAchievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|def| !record.is_unlocked(def.id))
        .filter(|def| progress.value_for(def.category) >= def.target)
        .map(|def| UnlockedAchievement {
            id: def.id.to_string(),
            name: def.name.to_string(),
            tier: def.tier,
            unlocked_at: now,
        })
        .collect()
}

/// Recomputes progress from scratch, refreshes the streak bookkeeping and
/// appends every newly reached achievement to `record`.
pub fn check_achievements(
    record: &mut AchievementRecord,
    tasks: &[Task],
    pomodoros: &[PomodoroRecord],
    now: NaiveDateTime,
    config: &EngineConfig,
) -> Vec<UnlockedAchievement> {
    let progress = AchievementProgress::compute(tasks, pomodoros, now.date(), config);
    record.streak = StreakState {
        current: progress.streak,
        last_date: progress.last_completion,
    };
    let unlocks = detect_unlocks(&progress, record, now);
    record.merge(&unlocks);
    unlocks
}
