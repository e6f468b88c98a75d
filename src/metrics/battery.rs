//! Simulated battery health.
//!
//! Not an electrical measurement: the "battery" stands for rider engagement
//! and drains a fixed amount for every calendar day without a ride.

use chrono::NaiveDate;

/// Health lost per idle calendar day.
pub const DECAY_PER_IDLE_DAY: i64 = 5;
/// Health reported for a rider who rode today or never rode.
pub const FULL_HEALTH: u8 = 100;

/// Whole calendar days between the last ride and today.
///
/// Negative when the last ride is dated in the future (clock skew).
pub fn idle_days(last_ride_day: NaiveDate, today: NaiveDate) -> i64 {
    (today - last_ride_day).num_days()
}

/// Battery health in percent, a step function of idle calendar days.
pub fn battery_health(last_ride_day: Option<NaiveDate>, today: NaiveDate) -> u8 {
    let Some(last_ride_day) = last_ride_day else {
        return FULL_HEALTH;
    };

    let days = idle_days(last_ride_day, today);
    if days <= 0 {
        return FULL_HEALTH;
    }

    let drained = days.saturating_mul(DECAY_PER_IDLE_DAY);
    (FULL_HEALTH as i64 - drained).max(0) as u8
}

/// Short human-readable status for the battery card.
pub fn battery_message(last_ride_day: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(last_ride_day) = last_ride_day else {
        return "Optimal (New)".to_string();
    };

    match idle_days(last_ride_day, today) {
        days if days <= 0 => "Optimal (Rode today)".to_string(),
        1 => "1 day idle".to_string(),
        days => format!("{} days idle", days),
    }
}
