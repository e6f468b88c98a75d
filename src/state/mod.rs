//! Bike state aggregate and the validated mutations that update it.

pub mod mutations;
pub mod types;

pub use types::{default_checklist, parse_due_date, BikeState, ChecklistItem, FuelEntry, Ride, TyrePressure};

/// Odometer reading a fresh state starts from.
pub const INITIAL_ODOMETER: f64 = 10_000.0;
/// Default end of the service progress window.
pub const INITIAL_TARGET_ODOMETER: f64 = 13_000.0;
/// Maximum entries kept in the ride and fuel logs.
pub const MAX_LOG_ENTRIES: usize = 50;
/// Number of segments on the fuel gauge.
pub const MAX_FUEL_BARS: u8 = 12;
/// Smallest refuel amount accepted, keeps efficiency division defined.
pub const MIN_FUEL_LITERS: f64 = 0.1;

/// Clamp a gauge reading to the valid segment range.
pub fn clamp_fuel_bars(bars: i64) -> u8 {
    bars.clamp(0, MAX_FUEL_BARS as i64) as u8
}

/// Floor a user-supplied number at `min`, mapping NaN and infinities to `min`.
pub fn at_least(value: f64, min: f64) -> f64 {
    if value.is_finite() {
        value.max(min)
    } else {
        min
    }
}
