//! Service deadline and odometer target arithmetic.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::state::Ride;

/// Days counted as "this week" for the activity summary.
pub const WEEK_DAYS: i64 = 7;

/// Whole days left until the service deadline.
///
/// Returns 0 when no deadline is set or the deadline has passed.
pub fn days_remaining(service_due_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    service_due_date
        .map(|due| (due - today).num_days().max(0))
        .unwrap_or(0)
}

/// Progress through the base..target odometer window, in percent.
///
/// An empty or inverted window reports 100.
pub fn progress_percent(current_odo: f64, base_odo: f64, target_odo: f64) -> f64 {
    let window = target_odo - base_odo;
    if window <= 0.0 {
        return 100.0;
    }
    ((current_odo - base_odo) / window * 100.0).clamp(0.0, 100.0)
}

/// Average km per day still needed to reach the target by the deadline.
pub fn daily_target(current_odo: f64, target_odo: f64, days_remaining: i64) -> f64 {
    if days_remaining <= 0 {
        return 0.0;
    }
    ((target_odo - current_odo) / days_remaining as f64).max(0.0)
}

/// Rides logged within the last week of `now`.
pub fn rides_this_week(rides: &[Ride], now: DateTime<Utc>) -> usize {
    let week_ago = now - Duration::days(WEEK_DAYS);
    rides.iter().filter(|ride| ride.date >= week_ago).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_remaining_without_deadline() {
        assert_eq!(days_remaining(None, day(2025, 6, 15)), 0);
    }

    #[test]
    fn test_days_remaining_counts_calendar_days() {
        assert_eq!(days_remaining(Some(day(2025, 6, 25)), day(2025, 6, 15)), 10);
        assert_eq!(days_remaining(Some(day(2025, 6, 15)), day(2025, 6, 15)), 0);
    }

    #[test]
    fn test_days_remaining_past_due_is_zero() {
        assert_eq!(days_remaining(Some(day(2025, 6, 1)), day(2025, 6, 15)), 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(10000.0, 10000.0, 13000.0), 0.0);
        assert_eq!(progress_percent(11500.0, 10000.0, 13000.0), 50.0);
        assert_eq!(progress_percent(14000.0, 10000.0, 13000.0), 100.0);
        assert_eq!(progress_percent(9000.0, 10000.0, 13000.0), 0.0);
    }

    #[test]
    fn test_progress_with_empty_window() {
        assert_eq!(progress_percent(10000.0, 13000.0, 13000.0), 100.0);
        assert_eq!(progress_percent(10000.0, 13000.0, 12000.0), 100.0);
    }

    #[test]
    fn test_daily_target() {
        assert_eq!(daily_target(10000.0, 13000.0, 30), 100.0);
        assert_eq!(daily_target(10000.0, 13000.0, 0), 0.0);
        // Target already passed
        assert_eq!(daily_target(13500.0, 13000.0, 10), 0.0);
    }

    #[test]
    fn test_rides_this_week() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let ride = |days_ago: i64| Ride {
            id: days_ago,
            date: now - Duration::days(days_ago),
            distance: 10.0,
            odometer: 10000.0,
        };
        let rides = [ride(0), ride(3), ride(7), ride(8), ride(30)];

        assert_eq!(rides_this_week(&rides, now), 3);
    }
}
