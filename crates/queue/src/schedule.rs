//! Collection-day policy: which date a "bin is full" trigger is about.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc, Weekday};

use binwatch_common::config::AppConfig;
use binwatch_common::error::AppError;

/// Weekly collection days in the household's local time.
#[derive(Debug, Clone)]
pub struct CollectionSchedule {
    days: Vec<Weekday>,
    offset: FixedOffset,
}

impl CollectionSchedule {
    pub fn new(days: Vec<Weekday>, utc_offset_hours: i32) -> Result<Self, AppError> {
        if days.is_empty() {
            return Err(AppError::Config(
                "collection schedule needs at least one weekday".to_string(),
            ));
        }
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::Config(format!("invalid UTC offset: {} hours", utc_offset_hours))
            })?;

        Ok(Self { days, offset })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.collection_days.clone(),
            config.collection_utc_offset_hours,
        )
    }

    /// The first collection day strictly after the local date of `now`.
    ///
    /// Today never counts, even if it is a collection day.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = now.with_timezone(&self.offset).date_naive();
        (1..=7)
            .filter_map(|i| today.checked_add_days(Days::new(i)))
            .find(|d| self.days.contains(&d.weekday()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn mon_thu_jst() -> CollectionSchedule {
        CollectionSchedule::new(vec![Weekday::Mon, Weekday::Thu], 9).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sunday_evening_picks_monday() {
        // 2025-01-05 12:00 UTC is Sunday 21:00 in JST.
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(mon_thu_jst().next_after(now), Some(ymd(2025, 1, 6)));
    }

    #[test]
    fn test_uses_local_date_not_utc_date() {
        // 2025-01-05 16:00 UTC is already Monday 01:00 in JST, so Monday is "today".
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 16, 0, 0).unwrap();
        assert_eq!(mon_thu_jst().next_after(now), Some(ymd(2025, 1, 9)));
    }

    #[test]
    fn test_single_day_wraps_a_full_week() {
        let schedule = CollectionSchedule::new(vec![Weekday::Mon], 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        assert_eq!(schedule.next_after(monday), Some(ymd(2025, 1, 13)));
    }

    #[test]
    fn test_rejects_empty_days_and_bad_offset() {
        assert!(CollectionSchedule::new(vec![], 9).is_err());
        assert!(CollectionSchedule::new(vec![Weekday::Mon], 48).is_err());
    }
}
