use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::db::{DeadlineRecord, DeadlineTypeRecord};

/// Overdue deadlines keep getting daily reminders for this many days.
pub const OVERDUE_REMINDER_DAYS: i64 = 7;

/// Signed whole days from `today` to `date`; negative once the date has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Overdue,
    Critical,
    Warning,
    Attention,
    Normal,
}

impl Urgency {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 0 => Self::Overdue,
            d if d <= 3 => Self::Critical,
            d if d <= 7 => Self::Warning,
            d if d <= 14 => Self::Attention,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Attention => "attention",
            Self::Normal => "normal",
        }
    }
}

/// The deadline's own schedule, or its type's defaults when it has none.
pub fn effective_reminder_days<'a>(
    deadline: &'a DeadlineRecord,
    deadline_type: &'a DeadlineTypeRecord,
) -> &'a [i32] {
    if deadline.reminder_days.is_empty() {
        &deadline_type.default_reminder_days
    } else {
        &deadline.reminder_days
    }
}

/// Whether a reminder is due at `days` before the deadline.
pub fn reminder_due(days: i64, schedule: &[i32]) -> bool {
    if days < 0 {
        return days >= -OVERDUE_REMINDER_DAYS;
    }
    schedule.iter().any(|offset| i64::from(*offset) == days)
}

/// UTC bounds `[start, end)` of the calendar day `day` in `tz`.
pub fn day_window<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_of = |date: NaiveDate| {
        let naive = date.and_time(NaiveTime::MIN);
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    };
    let next = day.succ_opt().unwrap_or(day);
    (start_of(day), start_of(next))
}
