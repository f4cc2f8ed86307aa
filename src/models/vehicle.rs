use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DeliveryFeeError, Result};

/// Vehicle used by the courier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Scooter,
    Bike,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Car, VehicleType::Scooter, VehicleType::Bike];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Scooter => "Scooter",
            VehicleType::Bike => "Bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VehicleType {
    type Err = DeliveryFeeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        VehicleType::ALL
            .into_iter()
            .find(|vehicle| vehicle.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DeliveryFeeError::validation(format!(
                    "Unknown vehicle type '{s}'. Must be one of: {}",
                    VehicleType::ALL.map(VehicleType::name).join(", ")
                ))
            })
    }
}
