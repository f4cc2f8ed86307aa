//! Data models for the delivery fee service
//!
//! - City: supported cities, tracked stations and regional base fees
//! - Vehicle: courier vehicle types
//! - Observation: persisted weather station readings

pub mod city;
pub mod observation;
pub mod vehicle;

pub use city::{BaseFee, BaseFeeTable, City};
pub use observation::StationObservation;
pub use vehicle::VehicleType;
