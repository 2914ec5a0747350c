//! Calendar helpers shared by the recurrence and streak code.
//!
//! Every helper returns `None` instead of panicking when the result falls
//! outside the range chrono can represent.

use chrono::{Datelike, Days, NaiveDate};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}

pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

pub fn add_weeks(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    add_days(date, u64::from(weeks) * 7)
}

/// Moves `(year, month)` forward by `months`, rolling December into January.
pub fn shift_month(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let zero_based = i64::from(year) * 12 + i64::from(month - 1) + i64::from(months);
    let year = i32::try_from(zero_based.div_euclid(12)).ok()?;
    let month = u32::try_from(zero_based.rem_euclid(12)).ok()? + 1;
    Some((year, month))
}

/// Builds a date with `day` clamped into the month, so day 31 of a 30-day
/// month becomes day 30.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// Weekday with Monday = 0.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}
