//! `DeliveryFee` - weather-aware delivery fees for food couriers
//!
//! The service ingests weather station observations on a schedule and quotes
//! delivery fees from a regional base fee plus weather surcharges.

pub mod api;
pub mod config;
pub mod error;
pub mod fees;
pub mod models;
pub mod store;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::DeliveryFeeConfig;
pub use error::DeliveryFeeError;
pub use fees::{DeliveryFeeService, FeeBreakdown, FeeEngine, FeeRejection};
pub use models::{BaseFee, BaseFeeTable, City, StationObservation, VehicleType};
pub use store::ObservationStore;
pub use weather::{FeedClient, FeedSource, Ingestor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DeliveryFeeError>;
