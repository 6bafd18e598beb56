//! Time sources and the notion of a "local day".

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now" for the services. Tests drive a [`ManualClock`].
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Maps instants to calendar days in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCalendar {
    offset: FixedOffset,
}

impl DayCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Uses `minutes` east of UTC when given, the host's current offset otherwise.
    /// Out-of-range offsets fall back to UTC.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        let offset = match minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .unwrap_or_else(utc_offset),
            None => Local::now().offset().fix(),
        };
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(utc_offset())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

impl Default for DayCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_of_follows_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(
            DayCalendar::utc().date_of(instant),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(
            DayCalendar::from_offset_minutes(Some(120)).date_of(instant),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
        assert_eq!(
            DayCalendar::from_offset_minutes(Some(-60 * 5)).date_of(instant),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(
            DayCalendar::from_offset_minutes(Some(60 * 48)),
            DayCalendar::utc()
        );
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
    }
}
