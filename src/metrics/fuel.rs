//! Fuel efficiency from the refuel log.
//!
//! The log is stored newest first. Each refuel is assumed to replace the fuel
//! burnt since the previous one, so an interval's efficiency is the distance
//! between two consecutive entries divided by the newer entry's liters.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::FuelEntry;

/// Number of recent refuels shown in the efficiency trend.
pub const TREND_WINDOW: usize = 5;

/// Efficiency of one refuel interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyPoint {
    /// Date of the refuel that closed the interval
    pub date: DateTime<Utc>,
    /// km per liter, rounded to one decimal
    pub km_per_liter: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Average km/L across every consecutive pair in the log.
///
/// Pairs with no forward distance are skipped. Returns 0 when fewer than two
/// entries exist or no pair contributes.
pub fn average_efficiency(log: &[FuelEntry]) -> f64 {
    if log.len() < 2 {
        return 0.0;
    }

    let (distance, liters) = log
        .windows(2)
        .filter_map(|pair| {
            let (newer, older) = (&pair[0], &pair[1]);
            let distance = newer.odo - older.odo;
            (distance > 0.0 && newer.liters > 0.0).then_some((distance, newer.liters))
        })
        .fold((0.0, 0.0), |(d, l), (distance, liters)| (d + distance, l + liters));

    if distance <= 0.0 || liters <= 0.0 {
        return 0.0;
    }

    round_to(distance / liters, 2)
}

/// Per-interval efficiency for the most recent refuels, oldest first.
///
/// Intervals without a positive efficiency are dropped.
pub fn efficiency_trend(log: &[FuelEntry]) -> Vec<EfficiencyPoint> {
    let recent: Vec<&FuelEntry> = log.iter().take(TREND_WINDOW).rev().collect();

    recent
        .windows(2)
        .filter_map(|pair| {
            let (older, newer) = (pair[0], pair[1]);
            let km_per_liter = round_to((newer.odo - older.odo) / newer.liters, 1);
            (km_per_liter > 0.0).then_some(EfficiencyPoint {
                date: newer.date,
                km_per_liter,
            })
        })
        .collect()
}

/// Total amount spent on fuel across the log.
pub fn total_cost(log: &[FuelEntry]) -> f64 {
    log.iter().map(|entry| entry.cost).sum()
}
