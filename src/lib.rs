//! RideTheBike - Personal Motorcycle Dashboard
//!
//! Tracks odometer progress toward a service target, a simulated battery
//! health that drains while the bike sits idle, chain lubrication, fuel
//! efficiency, tyre pressure and a pre-ride checklist. State is a single
//! snapshot persisted locally after every change.

pub mod dashboard;
pub mod integrations;
pub mod metrics;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use dashboard::{Clock, Dashboard, FixedClock, SystemClock};
pub use state::BikeState;
pub use storage::config::AppConfig;
pub use storage::{JsonFileStore, MemoryStore, StateStore};
