use chrono::{DateTime, Utc};

use crate::util::date::hours_between;

/// A completion counts toward the streak as long as it lands within 48 hours
/// of the previous one; a longer gap starts the streak over at 1.
pub const STREAK_GRACE_HOURS: f64 = 48.0;

/// Next streak value after completing a full set at `completed_at`.
pub fn next_streak(
    current_streak: i32,
    last_completed_at: Option<DateTime<Utc>>,
    completed_at: DateTime<Utc>,
) -> i32 {
    match last_completed_at {
        None => 1,
        Some(last) => {
            if hours_between(last, completed_at) < STREAK_GRACE_HOURS {
                current_streak + 1
            } else {
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, hour, 0, 0).unwrap()
    }

    #[test]
    fn first_completion_starts_at_one() {
        assert_eq!(next_streak(0, None, at(9)), 1);
    }

    #[test]
    fn completion_within_grace_period_increments() {
        let last = at(9);
        let next_day = last + Duration::hours(26);
        assert_eq!(next_streak(4, Some(last), next_day), 5);
    }

    #[test]
    fn completion_past_grace_period_resets() {
        let last = at(9);
        let much_later = last + Duration::hours(49);
        assert_eq!(next_streak(4, Some(last), much_later), 1);
    }

    #[test]
    fn exactly_48_hours_resets() {
        let last = at(9);
        let boundary = last + Duration::hours(48);
        assert_eq!(next_streak(4, Some(last), boundary), 1);
    }
}
