// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily cadence arithmetic

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use lk_core::{ScheduleConfig, ScheduleZone};

/// Fires once a day at `hour:minute` in the configured zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    hour: u32,
    minute: u32,
    zone: ScheduleZone,
}

impl DailySchedule {
    /// `None` when the time of day is out of range
    pub fn new(hour: u32, minute: u32, zone: ScheduleZone) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(Self { hour, minute, zone })
    }

    /// Out-of-range values are clamped; config validation rejects them first
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            hour: config.hour.min(23),
            minute: config.minute.min(59),
            zone: config.timezone,
        }
    }

    /// First fire strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match self.zone {
            ScheduleZone::Local => self.next_after_in(after, &chrono::Local),
            ScheduleZone::Utc => self.next_after_in(after, &Utc),
        }
    }

    /// Latest fire at or before `at`
    pub fn latest_at_or_before(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.zone {
            ScheduleZone::Local => self.latest_in(at, &chrono::Local),
            ScheduleZone::Utc => self.latest_in(at, &Utc),
        }
    }

    pub fn next_after_in<Tz: TimeZone>(&self, after: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let today = after.with_timezone(tz).date_naive();
        (0..=2)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .filter_map(|date| self.fire_on(date, tz))
            .find(|fire| *fire > after)
            .unwrap_or(after + chrono::Duration::days(1))
    }

    pub fn latest_in<Tz: TimeZone>(&self, at: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let today = at.with_timezone(tz).date_naive();
        (0..=2)
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .filter_map(|date| self.fire_on(date, tz))
            .find(|fire| *fire <= at)
            .unwrap_or(at - chrono::Duration::days(1))
    }

    /// Fire instant on a local date
    ///
    /// Ambiguous local times (clocks going back) resolve to the earlier
    /// instant; skipped local times (clocks going forward) fire an hour later.
    fn fire_on<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
        let local = date.and_hms_opt(self.hour, self.minute, 0)?;
        let resolved = match tz.from_local_datetime(&local) {
            LocalResult::Single(t) => Some(t),
            LocalResult::Ambiguous(earlier, _) => Some(earlier),
            LocalResult::None => tz
                .from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest(),
        };
        resolved.map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
