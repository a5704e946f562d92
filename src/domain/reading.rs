// Sensor reading domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A measured dimension of a plant's environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Temperature,
    Ph,
}

impl Quantity {
    pub const ALL: [Quantity; 2] = [Quantity::Temperature, Quantity::Ph];

    /// Value of the `data_type` parameter understood by the sensor API
    pub fn as_api_str(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Ph => "ph",
        }
    }

    /// Prefix used in alert type labels such as `pH_low`
    pub fn label(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Ph => "pH",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub device_id: String,
    pub location: String,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64, device_id: String, location: String) -> Self {
        Self {
            timestamp,
            value,
            device_id,
            location,
        }
    }
}

/// Pick the newest reading of a series; only the latest point is evaluated for alerts
pub fn latest_reading(readings: &[Reading]) -> Option<&Reading> {
    readings.iter().max_by_key(|r| r.timestamp)
}
