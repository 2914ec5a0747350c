use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dates;

/// How often a template task produces a new occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    /// Weekdays are Monday = 0 through Sunday = 6, sorted and unique.
    Weekly {
        #[serde(default)]
        weekdays: Vec<u8>,
    },
    /// A `month_day` of 0 repeats on the day of the template's current due date.
    Monthly {
        #[serde(default)]
        month_day: u32,
    },
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "end_type", rename_all = "snake_case")]
pub enum RecurrenceEnd {
    #[default]
    Never,
    Count { end_count: u32 },
    #[serde(rename = "date")]
    Until { end_date: NaiveDate },
}

impl RecurrenceEnd {
    /// Whether another occurrence dated `next` may be generated after
    /// `generated_count` earlier ones.
    pub fn permits(&self, next: NaiveDate, generated_count: u32) -> bool {
        match self {
            RecurrenceEnd::Never => true,
            RecurrenceEnd::Count { end_count } => generated_count < *end_count,
            RecurrenceEnd::Until { end_date } => next <= *end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    #[serde(flatten)]
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(flatten)]
    pub end: RecurrenceEnd,
    #[serde(default)]
    pub generated_count: u32,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval: interval.max(1),
            end: RecurrenceEnd::Never,
            generated_count: 0,
        }
    }

    pub fn daily(interval: u32) -> Self {
        Self::new(Frequency::Daily, interval)
    }

    pub fn weekly(interval: u32, weekdays: impl IntoIterator<Item = u8>) -> Self {
        Self::new(
            Frequency::Weekly {
                weekdays: clean_weekdays(weekdays),
            },
            interval,
        )
    }

    pub fn monthly(interval: u32, month_day: u32) -> Self {
        Self::new(
            Frequency::Monthly {
                month_day: month_day.min(31),
            },
            interval,
        )
    }

    pub fn yearly(interval: u32) -> Self {
        Self::new(Frequency::Yearly, interval)
    }

    pub fn with_end(mut self, end: RecurrenceEnd) -> Self {
        self.end = end;
        self
    }

    /// The date following `current`, or `None` when no further date can be
    /// built.
    pub fn next_after(&self, current: NaiveDate) -> Option<NaiveDate> {
        next_occurrence(current, self)
    }
}

/// Builds a rule from loosely-typed input such as a JSON body.
///
/// Never fails: unknown types mean "no recurrence", fields that do not
/// coerce to integers fall back to their defaults and the generated count
/// always starts at zero.
pub fn normalize_rule(raw: &Value) -> Option<RecurrenceRule> {
    let kind = raw.get("type").and_then(Value::as_str).unwrap_or("").trim();
    let frequency = match kind {
        "daily" => Frequency::Daily,
        "weekly" => Frequency::Weekly {
            weekdays: normalize_weekdays(raw.get("weekdays")),
        },
        "monthly" => Frequency::Monthly {
            month_day: coerce_int(raw.get("month_day"))
                .map(|day| day.clamp(0, 31) as u32)
                .unwrap_or(0),
        },
        "yearly" => Frequency::Yearly,
        _ => return None,
    };

    let interval = coerce_int(raw.get("interval"))
        .map(|value| value.clamp(1, i64::from(u32::MAX)) as u32)
        .unwrap_or(1);

    let end = match raw.get("end_type").and_then(Value::as_str) {
        Some("count") => RecurrenceEnd::Count {
            end_count: coerce_int(raw.get("end_count"))
                .map(|count| count.clamp(1, i64::from(u32::MAX)) as u32)
                .unwrap_or(1),
        },
        Some("date") => raw
            .get("end_date")
            .and_then(Value::as_str)
            .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
            .map(|end_date| RecurrenceEnd::Until { end_date })
            .unwrap_or_default(),
        _ => RecurrenceEnd::Never,
    };

    Some(RecurrenceRule {
        frequency,
        interval,
        end,
        generated_count: 0,
    })
}

/// Rebuilds a stored rule. Unlike [`normalize_rule`] the persisted
/// `generated_count` survives, so a count limit keeps counting across
/// restarts.
pub fn restore_rule(raw: &Value) -> Option<RecurrenceRule> {
    let mut rule = normalize_rule(raw)?;
    rule.generated_count = coerce_int(raw.get("generated_count"))
        .map(|count| count.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0);
    Some(rule)
}

/// `deserialize_with` adapter for stored rules: anything malformed degrades
/// to a task without recurrence instead of failing the whole document.
pub fn deserialize_stored_rule<'de, D>(
    deserializer: D,
) -> Result<Option<RecurrenceRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(restore_rule))
}

/// Computes the due date that follows `current` under `rule`.
///
/// Any date that cannot be represented yields `None`, which callers treat as
/// "stop generating".
pub fn next_occurrence(current: NaiveDate, rule: &RecurrenceRule) -> Option<NaiveDate> {
    let interval = rule.interval.max(1);
    match &rule.frequency {
        Frequency::Daily => dates::add_days(current, u64::from(interval)),
        Frequency::Weekly { weekdays } if weekdays.is_empty() => {
            dates::add_weeks(current, interval)
        }
        Frequency::Weekly { weekdays } => next_weekday(current, weekdays, interval),
        Frequency::Monthly { month_day } => {
            let day = if *month_day == 0 {
                current.day()
            } else {
                *month_day
            };
            let (year, month) = dates::shift_month(current.year(), current.month(), interval)?;
            dates::clamped_date(year, month, day)
        }
        Frequency::Yearly => {
            let year = current.year().checked_add(i32::try_from(interval).ok()?)?;
            let day = if current.month() == 2 && current.day() == 29 && !dates::is_leap_year(year)
            {
                28
            } else {
                current.day()
            };
            NaiveDate::from_ymd_opt(year, current.month(), day)
        }
    }
}

/// Walks forward one day at a time until a listed weekday is reached at
/// least `interval - 1` whole weeks after `current`.
///
/// The walk is capped at `7 * (interval + 1)` days after `current`; hitting
/// the cap yields `None`. Days before `7 * (interval - 1)` can never satisfy
/// the week requirement, so the walk starts there.
fn next_weekday(current: NaiveDate, weekdays: &[u8], interval: u32) -> Option<NaiveDate> {
    let min_weeks = u64::from(interval) - 1;
    let cap = 7 * (u64::from(interval) + 1);
    let first_step = (min_weeks * 7).max(1);
    for step in first_step..=cap {
        let candidate = dates::add_days(current, step)?;
        if step / 7 >= min_weeks && weekdays.contains(&dates::weekday_index(candidate)) {
            return Some(candidate);
        }
    }
    None
}

fn normalize_weekdays(raw: Option<&Value>) -> Vec<u8> {
    let Some(Value::Array(values)) = raw else {
        return Vec::new();
    };
    clean_weekdays(
        values
            .iter()
            .filter_map(|value| coerce_int(Some(value)))
            .filter(|day| (0..=6).contains(day))
            .map(|day| day as u8),
    )
}

fn clean_weekdays(days: impl IntoIterator<Item = u8>) -> Vec<u8> {
    let mut days: Vec<u8> = days.into_iter().filter(|day| *day <= 6).collect();
    days.sort_unstable();
    days.dedup();
    days
}

fn coerce_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}
