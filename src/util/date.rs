use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// The quiz day rolls over at midnight IST, matching the audience timezone.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

fn ist_offset() -> FixedOffset {
    // UTC+5:30 is a fixed offset with no DST, so FixedOffset is enough
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

pub fn to_ist(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&ist_offset())
}

/// Calendar date in IST for the given instant.
pub fn ist_date(instant: DateTime<Utc>) -> NaiveDate {
    to_ist(instant).date_naive()
}

/// Today's quiz date (IST).
pub fn today_ist() -> NaiveDate {
    ist_date(Utc::now())
}

/// Absolute gap between two instants in whole-and-fractional hours.
pub fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let seconds = (a - b).num_seconds().abs();
    seconds as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ist_date_rolls_over_before_utc() {
        // 19:00 UTC is already 00:30 the next day in IST
        let instant = Utc.with_ymd_and_hms(2026, 3, 10, 19, 0, 0).unwrap();
        assert_eq!(
            ist_date(instant),
            NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()
        );

        let earlier = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        assert_eq!(
            ist_date(earlier),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
        );
    }

    #[test]
    fn hours_between_is_symmetric() {
        let a = Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 3, 11, 7, 30, 0).unwrap();
        assert_eq!(hours_between(a, b), 25.5);
        assert_eq!(hours_between(b, a), 25.5);
    }
}
