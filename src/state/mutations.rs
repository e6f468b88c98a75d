//! State-changing actions on [`BikeState`].
//!
//! Every action takes the current instant explicitly and never fails: inputs
//! coming from form fields are clamped or ignored rather than rejected.

use chrono::{DateTime, NaiveDate, Utc};

use super::types::{BikeState, FuelEntry, Ride};
use super::{at_least, clamp_fuel_bars, MAX_FUEL_BARS, MAX_LOG_ENTRIES, MIN_FUEL_LITERS};

/// Derive a log id from the creation time, bumped past the newest existing id.
fn next_id(now: DateTime<Utc>, existing: impl Iterator<Item = i64>) -> i64 {
    let candidate = now.timestamp_millis();
    match existing.max() {
        Some(newest) if newest >= candidate => newest + 1,
        _ => candidate,
    }
}

impl BikeState {
    /// Record a ride and advance the odometer.
    ///
    /// Negative or non-finite distances count as zero; an entry is still
    /// recorded in that case.
    pub fn log_ride(&mut self, distance: f64, now: DateTime<Utc>) -> Ride {
        let distance = at_least(distance, 0.0);
        self.current_odo += distance;

        let ride = Ride {
            id: next_id(now, self.rides.iter().map(|r| r.id)),
            date: now,
            distance,
            odometer: self.current_odo,
        };

        self.last_ride_date = Some(now);
        self.rides.push(ride);
        self.sort_rides();

        tracing::debug!("Logged ride of {} km, odometer now {}", distance, self.current_odo);
        ride
    }

    /// Record a refuel at the current odometer and reset the gauge to full.
    pub fn log_fuel(&mut self, liters: f64, cost: f64, now: DateTime<Utc>) -> FuelEntry {
        let entry = FuelEntry {
            id: next_id(now, self.fuel_log.iter().map(|e| e.id)),
            date: now,
            odo: self.current_odo,
            liters: at_least(liters, MIN_FUEL_LITERS),
            cost: at_least(cost, 0.0),
        };

        self.fuel_log.push(entry);
        self.sort_fuel_log();
        // A refuel always means a full tank, whatever was actually added.
        self.fuel_bars = MAX_FUEL_BARS;

        tracing::debug!("Logged refuel of {} L at {}", entry.liters, entry.odo);
        entry
    }

    /// Mark the chain as lubricated at the current odometer.
    pub fn log_lube(&mut self) {
        self.last_lube_odo = self.current_odo;
    }

    /// Set the fuel gauge, clamped to 0-12 segments.
    pub fn set_fuel_bars(&mut self, bars: i64) {
        self.fuel_bars = clamp_fuel_bars(bars);
    }

    /// Store a tyre pressure reading.
    ///
    /// Values are not range checked. Non-finite numbers are stored as unset
    /// since they have no JSON representation.
    pub fn set_tyre_pressure(&mut self, front: Option<f64>, rear: Option<f64>, now: DateTime<Utc>) {
        self.tyre_pressure.front = front.filter(|v| v.is_finite());
        self.tyre_pressure.rear = rear.filter(|v| v.is_finite());
        self.tyre_pressure.last_updated = Some(now);
    }

    /// Override the odometer from settings. Non-finite input is ignored.
    pub fn set_current_odo(&mut self, odo: f64) {
        if odo.is_finite() {
            self.current_odo = odo.max(0.0);
        }
    }

    /// Set the start of the progress window. Non-finite input is ignored.
    pub fn set_base_odo(&mut self, odo: f64) {
        if odo.is_finite() {
            self.base_odo = odo;
        }
    }

    /// Set the end of the progress window. Non-finite input is ignored.
    pub fn set_target_odo(&mut self, odo: f64) {
        if odo.is_finite() {
            self.target_odo = odo;
        }
    }

    pub fn set_service_due_date(&mut self, date: Option<NaiveDate>) {
        self.service_due_date = date;
    }

    /// Flip a checklist item. Returns false when no item has that id.
    pub fn toggle_checklist_item(&mut self, id: &str) -> bool {
        match self.checklist.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    /// Clear every checklist flag.
    pub fn reset_checklist(&mut self) {
        for item in &mut self.checklist {
            item.checked = false;
        }
    }

    /// Re-establish the log and gauge invariants after loading a snapshot.
    pub fn normalize(&mut self) {
        self.fuel_bars = self.fuel_bars.min(MAX_FUEL_BARS);
        self.sort_rides();
        self.sort_fuel_log();
    }

    fn sort_rides(&mut self) {
        self.rides
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        self.rides.truncate(MAX_LOG_ENTRIES);
    }

    fn sort_fuel_log(&mut self) {
        self.fuel_log
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        self.fuel_log.truncate(MAX_LOG_ENTRIES);
    }
}
