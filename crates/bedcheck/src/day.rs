//! calendar-day windows in the dormitory's local time.
//!
//! every "today" in the system goes through this module. the ledger and
//! the attendance report both query the same half-open utc window, so a
//! record can never be counted as present on one screen and absent on
//! another.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// the local calendar date for an instant, in the configured offset.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// the utc window `[start, end)` covering one local calendar day.
///
/// records with `start <= recorded_at < end` belong to `day`.
pub fn day_window(day: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = day.and_hms_opt(0, 0, 0).expect("midnight always exists");
    let start = offset
        .from_local_datetime(&midnight)
        .single()
        .expect("fixed offsets have no dst gaps")
        .with_timezone(&Utc);
    (start, start + Duration::hours(24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn taipei() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_window_covers_local_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let (start, end) = day_window(day, taipei());

        // local midnight is 16:00 utc the previous evening
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 28, 16, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_local_date_rolls_over_before_utc() {
        // 17:30 utc is already 01:30 the next day in taipei
        let now = Utc.with_ymd_and_hms(2026, 2, 28, 17, 30, 0).unwrap();
        assert_eq!(
            local_date(now, taipei()),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(
            local_date(now, FixedOffset::east_opt(0).unwrap()),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_instant_falls_in_exactly_one_window() {
        let offset = taipei();
        let now = Utc.with_ymd_and_hms(2026, 2, 28, 16, 0, 0).unwrap();
        let today = local_date(now, offset);

        let (start, end) = day_window(today, offset);
        assert!(start <= now && now < end);

        // the previous day's window ends exactly where today's begins
        let (_, prev_end) = day_window(today.pred_opt().unwrap(), offset);
        assert_eq!(prev_end, start);
    }
}
