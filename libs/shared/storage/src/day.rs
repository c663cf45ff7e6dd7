//! Clinic-local day boundaries.
//!
//! The queue resets at the clinic's local midnight, not at UTC midnight. The
//! clinic offset comes from configuration so day bucketing stays stable no
//! matter where the process runs.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::store::DayWindow;

/// Fixed clinic offset from the configured minutes east of UTC.
pub fn clinic_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| {
        tracing::warn!(
            "CLINIC_UTC_OFFSET_MINUTES {} out of range, using UTC",
            offset_minutes
        );
        Utc.fix()
    })
}

/// UTC window `[local midnight, next local midnight)` for one clinic day.
pub fn day_window(date: NaiveDate, offset: FixedOffset) -> DayWindow {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let start_naive_utc = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    let start = DateTime::<Utc>::from_naive_utc_and_offset(start_naive_utc, Utc);
    DayWindow {
        start,
        end: start + Duration::days(1),
    }
}

/// Calendar date at the clinic right now.
pub fn current_day(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Window for the clinic day in progress.
pub fn window_today(offset: FixedOffset) -> DayWindow {
    day_window(current_day(offset), offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid RFC 3339 timestamp")
    }

    #[test]
    fn window_is_midnight_to_midnight_at_utc_clinic() {
        let window = day_window(
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            clinic_offset(0),
        );
        assert_eq!(window.start, utc("2024-03-14T00:00:00Z"));
        assert_eq!(window.end, utc("2024-03-15T00:00:00Z"));
    }

    #[test]
    fn window_shifts_with_clinic_offset() {
        // Clinic at UTC+1: local midnight is 23:00 UTC the evening before.
        let window = day_window(
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            clinic_offset(60),
        );
        assert_eq!(window.start, utc("2024-03-13T23:00:00Z"));
        assert_eq!(window.end, utc("2024-03-14T23:00:00Z"));
    }

    #[test]
    fn boundary_instants_land_in_different_buckets() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let window = day_window(day, clinic_offset(0));

        let late_night = utc("2024-03-14T23:59:59Z");
        let just_after_midnight = utc("2024-03-15T00:00:01Z");

        assert!(window.contains(late_night));
        assert!(!window.contains(just_after_midnight));

        let next = day_window(day.succ_opt().unwrap(), clinic_offset(0));
        assert!(next.contains(just_after_midnight));
    }

    #[test]
    fn window_end_is_exclusive() {
        let window = day_window(
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            clinic_offset(0),
        );
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(clinic_offset(100_000), Utc.fix());
    }
}
