//! Delivery fee calculation
//!
//! `engine` holds the pure pricing rules, `service` resolves the weather
//! observation to price against and feeds it to the engine.

pub mod engine;
pub mod service;

use thiserror::Error;

pub use engine::{FeeBreakdown, FeeEngine, PhenomenonClass};
pub use service::DeliveryFeeService;

/// Business rule outcomes that prevent a fee from being quoted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRejection {
    #[error("Usage of selected vehicle type is forbidden")]
    VehicleForbidden,

    #[error("No weather data to calculate fee")]
    NoWeatherData,
}
