//! External Integrations Module
//!
//! Read-only side channels that never touch the bike state.

pub mod weather;

// Re-export main types for convenience
pub use weather::{InsightsProvider, OpenMeteoProvider, RiderInsights, WeatherConfig, WeatherError};
