//! Rider insights: current weather, air quality and location.
//!
//! Purely decorative. Nothing here reads or writes the bike state, and a
//! failed fetch only turns the insights card "offline".

pub mod provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use provider::{Endpoints, InsightsProvider, OpenMeteoProvider};

/// Weather-related errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Rider insights are disabled")]
    Disabled,

    #[error("Location not configured")]
    LocationMissing,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Weather configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Whether insights are fetched at all
    pub enabled: bool,
    /// Latitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// How long a fetched result stays fresh, in minutes
    pub refresh_interval_minutes: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            refresh_interval_minutes: 15,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    /// Configured coordinates, if both are set.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Sky condition from a WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    RainShowers,
    Cloudy,
}

impl WeatherCondition {
    /// Map a WMO code to a condition.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1..=3 => WeatherCondition::PartlyCloudy,
            4..=48 => WeatherCondition::Fog,
            49..=55 => WeatherCondition::Drizzle,
            56..=65 => WeatherCondition::Rain,
            66..=77 => WeatherCondition::Snow,
            78..=82 => WeatherCondition::RainShowers,
            _ => WeatherCondition::Cloudy,
        }
    }

    /// Display text
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear Sky",
            WeatherCondition::PartlyCloudy => "Partly Cloudy",
            WeatherCondition::Fog => "Foggy",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Rain => "Raining",
            WeatherCondition::Snow => "Snowing",
            WeatherCondition::RainShowers => "Rain Showers",
            WeatherCondition::Cloudy => "Cloudy",
        }
    }
}

/// US AQI severity band (EPA scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AqiLevel {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiLevel {
    /// Classify a US AQI value.
    pub fn from_us_aqi(value: f64) -> Self {
        match value {
            v if v <= 50.0 => AqiLevel::Good,
            v if v <= 100.0 => AqiLevel::Moderate,
            v if v <= 150.0 => AqiLevel::Unhealthy,
            v if v <= 200.0 => AqiLevel::VeryUnhealthy,
            _ => AqiLevel::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
            AqiLevel::Hazardous => "Hazardous",
        }
    }
}

/// Current conditions at the rider's location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Temperature in °C, rounded
    pub temperature: i32,
    /// WMO weather code
    pub code: u16,
    pub condition: WeatherCondition,
    /// Chance of rain this hour, percent
    pub rain_probability: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// US AQI value
    pub value: f64,
    pub level: AqiLevel,
}

/// Everything shown on the insights card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderInsights {
    pub weather: CurrentWeather,
    pub air_quality: AirQuality,
    /// Reverse-geocoded city name
    pub city: String,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RiderInsights {
    /// Check if data is stale (older than given minutes)
    pub fn is_stale(&self, max_age_minutes: u32, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > chrono::Duration::minutes(max_age_minutes as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(45), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(53), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(75), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(81), WeatherCondition::RainShowers);
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(63).label(), "Raining");
    }

    #[test]
    fn test_aqi_thresholds() {
        assert_eq!(AqiLevel::from_us_aqi(0.0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_us_aqi(50.0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_us_aqi(51.0), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_us_aqi(100.0), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_us_aqi(150.0), AqiLevel::Unhealthy);
        assert_eq!(AqiLevel::from_us_aqi(200.0), AqiLevel::VeryUnhealthy);
        assert_eq!(AqiLevel::from_us_aqi(201.0), AqiLevel::Hazardous);
        assert_eq!(AqiLevel::VeryUnhealthy.label(), "Very Unhealthy");
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut config = WeatherConfig::default();
        assert!(config.location().is_none());

        config.latitude = Some(12.9);
        assert!(config.location().is_none());

        config.longitude = Some(77.6);
        assert_eq!(config.location(), Some((12.9, 77.6)));
    }

    #[test]
    fn test_is_stale() {
        let fetched_at = Utc::now();
        let insights = RiderInsights {
            weather: CurrentWeather {
                temperature: 24,
                code: 1,
                condition: WeatherCondition::PartlyCloudy,
                rain_probability: 10,
            },
            air_quality: AirQuality {
                value: 42.0,
                level: AqiLevel::Good,
            },
            city: "Pune".to_string(),
            fetched_at,
        };

        assert!(!insights.is_stale(15, fetched_at + chrono::Duration::minutes(10)));
        assert!(insights.is_stale(15, fetched_at + chrono::Duration::minutes(16)));
    }
}
