//! Delivery fee rules
//!
//! The total fee is the regional base fee plus three independent weather
//! surcharges: air temperature, wind speed and weather phenomenon. Wind and
//! phenomenon rules may instead forbid the vehicle type, in which case no fee
//! is produced at all.

use serde::Serialize;

use super::FeeRejection;
use crate::models::{BaseFeeTable, City, StationObservation, VehicleType};

/// Wind speed (m/s) above which bikes are not allowed
const BIKE_WIND_LIMIT: f64 = 20.0;
/// Wind speed (m/s) from which the bike wind surcharge applies
const BIKE_WIND_SURCHARGE_FROM: f64 = 10.0;
const EXTREME_COLD_BELOW: f64 = -10.0;
const FREEZING_UP_TO: f64 = 0.0;

/// Individual parts of a calculated fee
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub base: f64,
    pub air_temperature: f64,
    pub wind_speed: f64,
    pub phenomenon: f64,
}

impl FeeBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.base + self.air_temperature + self.wind_speed + self.phenomenon
    }
}

/// Weather phenomenon categories relevant for pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhenomenonClass {
    /// Snow or sleet
    Snow,
    Rain,
    /// Glaze, hail or thunder
    Dangerous,
    Other,
}

/// Classify a free-text phenomenon, ignoring case.
///
/// Branch order matters: snow/sleet wins over rain, which wins over the
/// dangerous set.
#[must_use]
pub fn classify_phenomenon(phenomenon: &str) -> PhenomenonClass {
    let text = phenomenon.trim().to_lowercase();
    if text.contains("snow") || text.contains("sleet") {
        PhenomenonClass::Snow
    } else if text.contains("rain") {
        PhenomenonClass::Rain
    } else if text == "glaze" || text == "hail" || text.contains("thunder") {
        PhenomenonClass::Dangerous
    } else {
        PhenomenonClass::Other
    }
}

/// Air temperature surcharge, applies to scooters and bikes
#[must_use]
pub fn air_temperature_fee(vehicle: VehicleType, air_temperature: Option<f64>) -> f64 {
    match air_temperature {
        Some(temperature) if vehicle != VehicleType::Car => {
            if temperature < EXTREME_COLD_BELOW {
                1.0
            } else if (EXTREME_COLD_BELOW..=FREEZING_UP_TO).contains(&temperature) {
                0.5
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Wind speed surcharge, applies to bikes only
pub fn wind_speed_fee(vehicle: VehicleType, wind_speed: Option<f64>) -> Result<f64, FeeRejection> {
    match wind_speed {
        Some(speed) if vehicle == VehicleType::Bike => {
            if speed > BIKE_WIND_LIMIT {
                Err(FeeRejection::VehicleForbidden)
            } else if (BIKE_WIND_SURCHARGE_FROM..=BIKE_WIND_LIMIT).contains(&speed) {
                Ok(0.5)
            } else {
                Ok(0.0)
            }
        }
        _ => Ok(0.0),
    }
}

/// Weather phenomenon surcharge, applies to scooters and bikes
pub fn phenomenon_fee(vehicle: VehicleType, phenomenon: Option<&str>) -> Result<f64, FeeRejection> {
    match phenomenon {
        Some(text) if vehicle != VehicleType::Car => match classify_phenomenon(text) {
            PhenomenonClass::Snow => Ok(1.0),
            PhenomenonClass::Rain => Ok(0.5),
            PhenomenonClass::Dangerous => Err(FeeRejection::VehicleForbidden),
            PhenomenonClass::Other => Ok(0.0),
        },
        _ => Ok(0.0),
    }
}

/// Stateless fee calculator over a validated base fee table
#[derive(Debug, Clone)]
pub struct FeeEngine {
    base_fees: BaseFeeTable,
}

impl FeeEngine {
    #[must_use]
    pub fn new(base_fees: BaseFeeTable) -> Self {
        Self { base_fees }
    }

    #[must_use]
    pub fn base_fees(&self) -> &BaseFeeTable {
        &self.base_fees
    }

    /// Compute every fee component for a resolved observation
    pub fn breakdown(
        &self,
        city: City,
        vehicle: VehicleType,
        observation: &StationObservation,
    ) -> Result<FeeBreakdown, FeeRejection> {
        Ok(FeeBreakdown {
            base: self.base_fees.base_fee(city, vehicle),
            air_temperature: air_temperature_fee(vehicle, observation.air_temperature),
            wind_speed: wind_speed_fee(vehicle, observation.wind_speed)?,
            phenomenon: phenomenon_fee(vehicle, observation.phenomenon.as_deref())?,
        })
    }

    /// Total delivery fee for a resolved observation
    pub fn calculate(
        &self,
        city: City,
        vehicle: VehicleType,
        observation: &StationObservation,
    ) -> Result<f64, FeeRejection> {
        self.breakdown(city, vehicle, observation)
            .map(|breakdown| breakdown.total())
    }
}
