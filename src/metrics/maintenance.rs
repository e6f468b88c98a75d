//! Chain lubrication tracking.

/// Distance between recommended chain lubrications, in km.
pub const LUBE_INTERVAL_KM: f64 = 500.0;

/// Distance ridden since the chain was last lubricated.
pub fn km_since_lube(current_odo: f64, last_lube_odo: f64) -> f64 {
    current_odo - last_lube_odo
}

/// Chain health in percent, decaying linearly to zero over one lube interval.
pub fn chain_health(current_odo: f64, last_lube_odo: f64) -> f64 {
    let used = km_since_lube(current_odo, last_lube_odo) / LUBE_INTERVAL_KM;
    (100.0 - used * 100.0).clamp(0.0, 100.0)
}
