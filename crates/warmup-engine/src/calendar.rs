// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar-day arithmetic pinned to a single IANA time zone.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use warmup_core::types::{Domain, SendWindow};
use warmup_core::WarmupError;

/// Maps instants to local calendar dates and campaign day indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignCalendar {
    tz: Tz,
}

impl CampaignCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a calendar from an IANA zone name such as `Europe/Berlin`.
    pub fn from_name(name: &str) -> Result<Self, WarmupError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| WarmupError::Config(format!("unknown time zone `{name}`")))
    }

    /// The calendar a domain resets on: its own zone, or this one.
    pub fn for_domain(&self, domain: &Domain) -> Result<Self, WarmupError> {
        match domain.timezone.as_deref() {
            Some(name) => Self::from_name(name),
            None => Ok(*self),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local calendar date of `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// 1-based campaign day: day 1 is `start`, day 0 and below are before the start.
    pub fn day_index(&self, start: NaiveDate, now: DateTime<Utc>) -> i64 {
        (self.local_date(now) - start).num_days() + 1
    }

    /// Local date of campaign day `day`.
    pub fn date_of_day(&self, start: NaiveDate, day: i64) -> Option<NaiveDate> {
        let offset = u64::try_from(day.checked_sub(1)?).ok()?;
        start.checked_add_days(Days::new(offset))
    }

    /// First instant of the local date `date`.
    ///
    /// When midnight does not exist (a DST gap), the first valid instant after it is used.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let mut local = date.and_time(NaiveTime::MIN);
        for _ in 0..4 {
            if let Some(instant) = self.tz.from_local_datetime(&local).earliest() {
                return instant.with_timezone(&Utc);
            }
            local += chrono::Duration::minutes(30);
        }
        // Zones never skip more than two hours.
        date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Fraction of `window` elapsed at `now`, or `None` outside the window.
    pub fn window_progress(&self, window: SendWindow, now: DateTime<Utc>) -> Option<f64> {
        let local = now.with_timezone(&self.tz);
        let secs = i64::from(local.num_seconds_from_midnight());
        let start = i64::from(window.start_hour) * 3600;
        let end = i64::from(window.end_hour) * 3600;
        if secs < start || secs >= end {
            return None;
        }
        Some((secs - start) as f64 / (end - start) as f64)
    }
}

impl Default for CampaignCalendar {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_index_is_one_based() {
        let cal = CampaignCalendar::default();
        let start = date(2026, 3, 1);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap();
        assert_eq!(cal.day_index(start, now), 1);
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        assert_eq!(cal.day_index(start, now), 3);
        let now = Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap();
        assert_eq!(cal.day_index(start, now), 0);
    }

    #[test]
    fn day_index_follows_local_zone() {
        let cal = CampaignCalendar::from_name("Asia/Tokyo").unwrap();
        let start = date(2026, 3, 2);
        // 16:00 UTC on March 1st is already 01:00 on March 2nd in Tokyo.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(cal.day_index(start, now), 1);
    }

    #[test]
    fn unknown_zone_is_a_config_error() {
        assert!(matches!(
            CampaignCalendar::from_name("Atlantis/Central"),
            Err(WarmupError::Config(_))
        ));
    }

    #[test]
    fn start_of_day_in_zone() {
        let cal = CampaignCalendar::from_name("Europe/Berlin").unwrap();
        let start = cal.start_of_day(date(2026, 1, 15));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 14, 23, 0, 0).unwrap());
    }

    #[test]
    fn start_of_day_survives_midnight_dst_gap() {
        // Santiago skips from 00:00 to 01:00 when DST begins.
        let cal = CampaignCalendar::from_name("America/Santiago").unwrap();
        let d = date(2026, 9, 6);
        let start = cal.start_of_day(d);
        assert_eq!(cal.local_date(start), d);
    }

    #[test]
    fn date_of_day_offsets_from_start() {
        let cal = CampaignCalendar::default();
        let start = date(2026, 3, 30);
        assert_eq!(cal.date_of_day(start, 1), Some(start));
        assert_eq!(cal.date_of_day(start, 3), Some(date(2026, 4, 1)));
        assert_eq!(cal.date_of_day(start, 0), None);
    }

    #[test]
    fn window_progress_inside_and_outside() {
        let cal = CampaignCalendar::default();
        let window = SendWindow { start_hour: 8, end_hour: 16 };
        let at = |h, m| Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap();
        assert_eq!(cal.window_progress(window, at(7, 59)), None);
        assert_eq!(cal.window_progress(window, at(8, 0)), Some(0.0));
        assert_eq!(cal.window_progress(window, at(12, 0)), Some(0.5));
        assert_eq!(cal.window_progress(window, at(16, 0)), None);
    }

    #[test]
    fn domain_zone_overrides_default() {
        let cal = CampaignCalendar::default();
        let domain = Domain {
            id: warmup_core::DomainId(1),
            hostname: "mail.example.com".into(),
            daily_limit: 10,
            sent_today: 0,
            active: true,
            verified: true,
            phase: warmup_core::types::WarmupPhase::Initial,
            timezone: Some("America/Chicago".into()),
            last_reset_on: None,
        };
        assert_eq!(
            cal.for_domain(&domain).unwrap().timezone(),
            chrono_tz::America::Chicago
        );
    }
}
