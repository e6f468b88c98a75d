//! Derived dashboard metrics.
//!
//! Pure functions over primitive inputs. Calendar-day arithmetic takes
//! already-localized dates so the caller decides which timezone "today" is in.

pub mod battery;
pub mod fuel;
pub mod maintenance;
pub mod schedule;

pub use battery::{battery_health, battery_message};
pub use fuel::{average_efficiency, efficiency_trend, total_cost, EfficiencyPoint};
pub use maintenance::{chain_health, km_since_lube, LUBE_INTERVAL_KM};
pub use schedule::{daily_target, days_remaining, progress_percent, rides_this_week};
