//! Persisted bike state and its log entry types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{INITIAL_ODOMETER, INITIAL_TARGET_ODOMETER, MAX_FUEL_BARS};

/// A single logged ride.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Creation-time derived identifier (Unix milliseconds)
    pub id: i64,
    /// When the ride was logged
    pub date: DateTime<Utc>,
    /// Distance ridden in km
    pub distance: f64,
    /// Odometer reading after the ride
    pub odometer: f64,
}

/// A single refuel event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelEntry {
    /// Creation-time derived identifier (Unix milliseconds)
    pub id: i64,
    /// When the refuel was logged
    pub date: DateTime<Utc>,
    /// Odometer reading at the pump
    pub odo: f64,
    /// Liters added (never below 0.1)
    pub liters: f64,
    /// Amount paid
    pub cost: f64,
}

/// Last manual tyre pressure reading, in PSI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TyrePressure {
    pub front: Option<f64>,
    pub rear: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One pre-ride safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub checked: bool,
}

impl ChecklistItem {
    fn unchecked(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            checked: false,
        }
    }
}

/// The fixed pre-ride checklist.
pub fn default_checklist() -> Vec<ChecklistItem> {
    vec![
        ChecklistItem::unchecked("gear", "Helmet & Safety Gear"),
        ChecklistItem::unchecked("fluids", "Oil & Brake Fluid Levels"),
        ChecklistItem::unchecked("chain", "Chain Tension & Slack"),
        ChecklistItem::unchecked("lights", "Headlight & Indicators"),
    ]
}

/// The single persisted aggregate behind the dashboard.
///
/// Field names serialize in camelCase so a snapshot stays readable next to
/// older exports. Every field falls back to its initial value when missing,
/// which keeps loading forward-compatible with partial or older files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BikeState {
    /// Cumulative distance reading in km
    pub current_odo: f64,
    /// Start of the service progress window
    pub base_odo: f64,
    /// End of the service progress window
    pub target_odo: f64,
    /// Deadline for reaching the target odometer
    #[serde(deserialize_with = "deserialize_due_date")]
    pub service_due_date: Option<NaiveDate>,
    /// When the most recent ride was logged
    pub last_ride_date: Option<DateTime<Utc>>,
    /// Ride log, newest first
    pub rides: Vec<Ride>,
    /// Odometer at the last chain lubrication
    pub last_lube_odo: f64,
    /// Refuel log, newest first
    pub fuel_log: Vec<FuelEntry>,
    /// Coarse fuel gauge segments (0-12)
    #[serde(deserialize_with = "deserialize_fuel_bars")]
    pub fuel_bars: u8,
    pub tyre_pressure: TyrePressure,
    pub checklist: Vec<ChecklistItem>,
}

impl Default for BikeState {
    fn default() -> Self {
        Self {
            current_odo: INITIAL_ODOMETER,
            base_odo: INITIAL_ODOMETER,
            target_odo: INITIAL_TARGET_ODOMETER,
            service_due_date: None,
            last_ride_date: None,
            rides: Vec::new(),
            last_lube_odo: INITIAL_ODOMETER,
            fuel_log: Vec::new(),
            fuel_bars: MAX_FUEL_BARS,
            tyre_pressure: TyrePressure::default(),
            checklist: default_checklist(),
        }
    }
}

/// Parse a service deadline from either a calendar date or a full timestamp.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_due_date))
}

fn deserialize_fuel_bars<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(super::clamp_fuel_bars(raw as i64))
}
