use crate::occurrence::DEFAULT_CATCH_UP_CAP;

/// Tunables for the recurrence scan and achievement windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on occurrences generated per template in one scan.
    pub catch_up_cap: usize,
    /// Completions before this local hour count as early.
    pub early_before_hour: u32,
    /// Completions at or after this local hour count as late-night.
    pub night_from_hour: u32,
    /// Local hour at which a generated occurrence's reminder fires.
    pub reminder_hour: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catch_up_cap: DEFAULT_CATCH_UP_CAP,
            early_before_hour: 9,
            night_from_hour: 22,
            reminder_hour: 9,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `TODO_CATCH_UP_CAP`, `TODO_EARLY_BEFORE_HOUR`,
    /// `TODO_NIGHT_FROM_HOUR` and `TODO_REMINDER_HOUR` through `lookup`.
    /// Unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(cap) = lookup("TODO_CATCH_UP_CAP") {
            if let Ok(value) = cap.trim().parse::<usize>() {
                if value > 0 {
                    config.catch_up_cap = value;
                }
            }
        }
        if let Some(hour) = lookup("TODO_EARLY_BEFORE_HOUR") {
            if let Ok(value) = hour.trim().parse::<u32>() {
                config.early_before_hour = value.min(24);
            }
        }
        if let Some(hour) = lookup("TODO_NIGHT_FROM_HOUR") {
            if let Ok(value) = hour.trim().parse::<u32>() {
                config.night_from_hour = value.min(24);
            }
        }
        if let Some(hour) = lookup("TODO_REMINDER_HOUR") {
            if let Ok(value) = hour.trim().parse::<u32>() {
                if value < 24 {
                    config.reminder_hour = value;
                }
            }
        }
        config
    }
}
