//! Delivery cities and their regional base fees

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::VehicleType;
use crate::{DeliveryFeeError, Result};

/// City a delivery takes place in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Tallinn,
    Tartu,
    #[serde(rename = "Pärnu")]
    Parnu,
}

impl City {
    /// Every supported city, in table order
    pub const ALL: [City; 3] = [City::Tallinn, City::Tartu, City::Parnu];

    /// Display name, also used for station lookups
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            City::Tallinn => "Tallinn",
            City::Tartu => "Tartu",
            City::Parnu => "Pärnu",
        }
    }

    /// Name of the weather station whose readings stand for this city
    #[must_use]
    pub const fn station_name(self) -> &'static str {
        match self {
            City::Tallinn => "Tallinn-Harku",
            City::Tartu => "Tartu-Tõravere",
            City::Parnu => "Pärnu",
        }
    }

    /// Whether a tracked station name belongs to this city
    #[must_use]
    pub fn matches_station(self, station_name: &str) -> bool {
        station_name
            .to_lowercase()
            .contains(&self.name().to_lowercase())
    }

    const fn index(self) -> usize {
        match self {
            City::Tallinn => 0,
            City::Tartu => 1,
            City::Parnu => 2,
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = DeliveryFeeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        City::ALL
            .into_iter()
            .find(|city| city.name().to_lowercase() == wanted)
            .ok_or_else(|| {
                DeliveryFeeError::validation(format!(
                    "Unknown city '{s}'. Must be one of: {}",
                    City::ALL.map(City::name).join(", ")
                ))
            })
    }
}

/// Base fees of one city, per vehicle type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseFee {
    pub car: f64,
    pub scooter: f64,
    pub bike: f64,
}

impl BaseFee {
    #[must_use]
    pub const fn new(car: f64, scooter: f64, bike: f64) -> Self {
        Self { car, scooter, bike }
    }

    #[must_use]
    pub const fn for_vehicle(&self, vehicle: VehicleType) -> f64 {
        match vehicle {
            VehicleType::Car => self.car,
            VehicleType::Scooter => self.scooter,
            VehicleType::Bike => self.bike,
        }
    }

    fn is_valid(&self) -> bool {
        [self.car, self.scooter, self.bike]
            .iter()
            .all(|fee| fee.is_finite() && *fee >= 0.0)
    }
}

const STANDARD_BASE_FEES: [(City, BaseFee); 3] = [
    (City::Tallinn, BaseFee::new(4.0, 3.5, 3.0)),
    (City::Tartu, BaseFee::new(3.5, 3.0, 2.5)),
    (City::Parnu, BaseFee::new(3.0, 2.5, 2.0)),
];

/// Regional base fee table covering every city
///
/// Only constructible through [`BaseFeeTable::from_entries`], which checks
/// that each city is present exactly once, so lookups never miss.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseFeeTable {
    fees: [BaseFee; 3],
}

impl BaseFeeTable {
    /// The fee table used in production
    pub fn standard() -> Result<Self> {
        Self::from_entries(STANDARD_BASE_FEES)
    }

    /// Build a table from `(city, fee)` pairs
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (City, BaseFee)>,
    {
        let mut by_city: HashMap<City, BaseFee> = HashMap::new();
        for (city, fee) in entries {
            if !fee.is_valid() {
                return Err(DeliveryFeeError::config(format!(
                    "Base fees for {city} must be finite and non-negative"
                )));
            }
            if by_city.insert(city, fee).is_some() {
                return Err(DeliveryFeeError::config(format!(
                    "Base fees for {city} are defined more than once"
                )));
            }
        }

        let missing: Vec<&str> = City::ALL
            .into_iter()
            .filter(|city| !by_city.contains_key(city))
            .map(City::name)
            .collect();
        if !missing.is_empty() {
            return Err(DeliveryFeeError::config(format!(
                "Base fees missing for: {}",
                missing.join(", ")
            )));
        }

        let mut fees = [BaseFee::new(0.0, 0.0, 0.0); 3];
        for (city, fee) in by_city {
            fees[city.index()] = fee;
        }
        Ok(Self { fees })
    }

    /// Regional base fee for a city and vehicle type
    #[must_use]
    pub fn base_fee(&self, city: City, vehicle: VehicleType) -> f64 {
        self.fees[city.index()].for_vehicle(vehicle)
    }
}
