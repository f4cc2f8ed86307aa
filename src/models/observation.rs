//! Weather station observation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weather reading of a tracked station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationObservation {
    /// Surrogate id, assigned by the store on save
    pub id: Option<u64>,
    /// Station name as published in the feed, e.g. "Tallinn-Harku"
    pub station_name: String,
    /// WMO station code
    pub wmo_code: Option<i32>,
    /// Air temperature in Celsius
    pub air_temperature: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Free-text weather phenomenon, e.g. "Light snow shower"
    pub phenomenon: Option<String>,
    /// Batch timestamp of the feed pull this reading came from
    pub timestamp: DateTime<Utc>,
}

impl StationObservation {
    /// Observation with no measured values, mostly useful as a base for tests
    #[must_use]
    pub fn new(station_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            station_name: station_name.into(),
            wmo_code: None,
            air_temperature: None,
            wind_speed: None,
            phenomenon: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn with_air_temperature(mut self, value: f64) -> Self {
        self.air_temperature = Some(value);
        self
    }

    #[must_use]
    pub fn with_wind_speed(mut self, value: f64) -> Self {
        self.wind_speed = Some(value);
        self
    }

    #[must_use]
    pub fn with_phenomenon(mut self, value: impl Into<String>) -> Self {
        self.phenomenon = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_wmo_code(mut self, value: i32) -> Self {
        self.wmo_code = Some(value);
        self
    }
}
