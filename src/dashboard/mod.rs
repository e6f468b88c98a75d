//! Dashboard state container.
//!
//! [`Dashboard`] owns the [`BikeState`], a persistence adapter and a clock.
//! The presentation layer holds one by reference, reads derived values from it
//! and calls its actions; every action writes the new snapshot through.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use chrono::NaiveDate;

use crate::metrics::{self, EfficiencyPoint};
use crate::state::{BikeState, FuelEntry, Ride};
use crate::storage::{StateStore, StoreError};

/// Bike state plus its persistence and time source.
pub struct Dashboard<S: StateStore, C: Clock = SystemClock> {
    state: BikeState,
    store: S,
    clock: C,
    dirty: bool,
}

impl<S: StateStore, C: Clock> Dashboard<S, C> {
    /// Load the last snapshot, falling back to a fresh state.
    ///
    /// A missing snapshot is the normal first-run case. An unreadable or
    /// corrupt one is logged and replaced by defaults on the next save.
    pub fn open(store: S, clock: C) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => {
                tracing::info!("Loaded bike state ({} rides, {} refuels)", state.rides.len(), state.fuel_log.len());
                state
            }
            Ok(None) => {
                tracing::info!("No saved bike state, starting fresh");
                BikeState::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load bike state, starting fresh: {}", e);
                BikeState::default()
            }
        };

        Self {
            state,
            store,
            clock,
            dirty: false,
        }
    }

    pub fn state(&self) -> &BikeState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Whether the latest change has not reached the store yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry a pending save, reporting the error if it fails again.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.store.save(&self.state)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Persist after a mutation. Failures leave the dashboard dirty.
    fn commit(&mut self) {
        self.dirty = true;
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to save bike state: {}", e);
        }
    }

    fn mutate<T>(&mut self, action: impl FnOnce(&mut BikeState) -> T) -> T {
        let result = action(&mut self.state);
        self.commit();
        result
    }

    // Actions

    pub fn log_ride(&mut self, distance: f64) -> Ride {
        let now = self.clock.now();
        self.mutate(|state| state.log_ride(distance, now))
    }

    pub fn log_fuel(&mut self, liters: f64, cost: f64) -> FuelEntry {
        let now = self.clock.now();
        self.mutate(|state| state.log_fuel(liters, cost, now))
    }

    pub fn log_lube(&mut self) {
        self.mutate(BikeState::log_lube)
    }

    pub fn set_fuel_bars(&mut self, bars: i64) {
        self.mutate(|state| state.set_fuel_bars(bars))
    }

    pub fn set_tyre_pressure(&mut self, front: Option<f64>, rear: Option<f64>) {
        let now = self.clock.now();
        self.mutate(|state| state.set_tyre_pressure(front, rear, now))
    }

    pub fn set_current_odo(&mut self, odo: f64) {
        self.mutate(|state| state.set_current_odo(odo))
    }

    pub fn set_base_odo(&mut self, odo: f64) {
        self.mutate(|state| state.set_base_odo(odo))
    }

    pub fn set_target_odo(&mut self, odo: f64) {
        self.mutate(|state| state.set_target_odo(odo))
    }

    pub fn set_service_due_date(&mut self, date: Option<NaiveDate>) {
        self.mutate(|state| state.set_service_due_date(date))
    }

    pub fn toggle_checklist_item(&mut self, id: &str) -> bool {
        self.mutate(|state| state.toggle_checklist_item(id))
    }

    pub fn reset_checklist(&mut self) {
        self.mutate(BikeState::reset_checklist)
    }

    // Derived values

    fn last_ride_day(&self) -> Option<NaiveDate> {
        self.state.last_ride_date.map(|at| self.clock.local_date(at))
    }

    pub fn battery_health(&self) -> u8 {
        metrics::battery_health(self.last_ride_day(), self.clock.today())
    }

    pub fn battery_message(&self) -> String {
        metrics::battery_message(self.last_ride_day(), self.clock.today())
    }

    pub fn chain_health(&self) -> f64 {
        metrics::chain_health(self.state.current_odo, self.state.last_lube_odo)
    }

    pub fn days_remaining(&self) -> i64 {
        metrics::days_remaining(self.state.service_due_date, self.clock.today())
    }

    pub fn average_fuel_efficiency(&self) -> f64 {
        metrics::average_efficiency(&self.state.fuel_log)
    }

    pub fn fuel_trend(&self) -> Vec<EfficiencyPoint> {
        metrics::efficiency_trend(&self.state.fuel_log)
    }

    pub fn total_fuel_cost(&self) -> f64 {
        metrics::total_cost(&self.state.fuel_log)
    }

    pub fn progress_percent(&self) -> f64 {
        metrics::progress_percent(self.state.current_odo, self.state.base_odo, self.state.target_odo)
    }

    /// Run-rate: km per day needed to reach the target by the deadline.
    pub fn daily_target(&self) -> f64 {
        metrics::daily_target(self.state.current_odo, self.state.target_odo, self.days_remaining())
    }

    pub fn rides_this_week(&self) -> usize {
        metrics::rides_this_week(&self.state.rides, self.clock.now())
    }

    pub fn is_checklist_complete(&self) -> bool {
        self.state.checklist.iter().all(|item| item.checked)
    }
}
