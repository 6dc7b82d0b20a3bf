use chrono::{Duration, NaiveDateTime};

const SPRINT_DAYS: i64 = 14;
const SECONDS_PER_DAY: i64 = 86_400;

/// A two-week window `[start, end]`, with `end` 13 days after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprintWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SprintWindow {
    fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: start + Duration::days(SPRINT_DAYS - 1),
        }
    }

    /// The window of the sprint grid anchored at `epoch` that contains `date`.
    pub fn containing(epoch: NaiveDateTime, date: NaiveDateTime) -> Self {
        // Whole days, rounded towards the past like a calendar would.
        let days = (date - epoch).num_seconds().div_euclid(SECONDS_PER_DAY);
        let steps = if days < 0 {
            -((-days + SPRINT_DAYS - 1) / SPRINT_DAYS)
        } else {
            days / SPRINT_DAYS
        };
        Self::starting_at(epoch + Duration::days(steps * SPRINT_DAYS))
    }

    /// Archive lists are named after their window's first day.
    pub fn list_name(&self) -> String {
        format_date(self.start)
    }
}

pub fn format_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}
