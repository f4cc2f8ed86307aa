//! Observation feed normalization
//!
//! Turns the XML observations document published by the weather service into
//! validated [`StationObservation`]s for the tracked stations. The feed is
//! only semi-trusted: a single bad station entry is skipped, never the batch.

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::models::{City, StationObservation};
use crate::{DeliveryFeeError, Result};

const STATION_TAG: &[u8] = b"station";

/// One `<station>` entry. Every field is kept as raw text; a missing
/// element reads the same as an empty one.
#[derive(Debug, Deserialize)]
pub struct StationXml {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wmocode: String,
    #[serde(default)]
    pub airtemperature: String,
    #[serde(default)]
    pub windspeed: String,
    #[serde(default)]
    pub phenomenon: String,
}

/// Observations document split into its batch timestamp and the raw markup
/// of each `<station>` entry
#[derive(Debug, Default)]
pub struct ObservationsDocument<'a> {
    /// Value of the root `timestamp` attribute, epoch seconds
    pub timestamp: Option<String>,
    pub stations: Vec<Cow<'a, str>>,
}

fn xml_error(e: impl Display) -> DeliveryFeeError {
    DeliveryFeeError::feed(format!("Failed to parse observations XML: {e}"))
}

impl<'a> ObservationsDocument<'a> {
    /// Walk the document without interpreting station entries, so one broken
    /// entry cannot take the others down with it. Children of the root other
    /// than `<station>` are skipped.
    pub fn split(xml_content: &'a str) -> Result<Self> {
        let mut reader = Reader::from_str(xml_content);
        let mut document = ObservationsDocument::default();
        let mut in_root = false;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(element) if !in_root => {
                    in_root = true;
                    document.timestamp = element
                        .try_get_attribute("timestamp")
                        .map_err(xml_error)?
                        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
                }
                Event::Empty(element) if !in_root => {
                    document.timestamp = element
                        .try_get_attribute("timestamp")
                        .map_err(xml_error)?
                        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
                    return Ok(document);
                }
                Event::Start(element) => {
                    let content = reader.read_text(element.name()).map_err(xml_error)?;
                    if element.name().as_ref() == STATION_TAG {
                        document.stations.push(content);
                    }
                }
                Event::End(_) => return Ok(document),
                Event::Eof if in_root => {
                    return Err(DeliveryFeeError::feed("Observations document is truncated"));
                }
                Event::Eof => {
                    return Err(DeliveryFeeError::feed("Observations document is empty"));
                }
                _ => {}
            }
        }
    }

    /// Batch timestamp of the document, if present and valid
    pub fn batch_timestamp(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .timestamp
            .as_deref()
            .and_then(non_empty)
            .ok_or_else(|| DeliveryFeeError::feed("Observations timestamp attribute is missing"))?;

        let seconds = raw.parse::<i64>().map_err(|e| {
            DeliveryFeeError::feed(format!("Invalid observations timestamp '{raw}': {e}"))
        })?;

        DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            DeliveryFeeError::feed(format!("Observations timestamp '{raw}' is out of range"))
        })
    }
}

/// Whether a feed station name is one of the tracked stations (exact match)
#[must_use]
pub fn is_tracked_station(name: &str) -> bool {
    City::ALL.iter().any(|city| city.station_name() == name)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_field<T>(field: &str, value: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    non_empty(value)
        .map(|text| {
            text.parse::<T>().map_err(|e| {
                DeliveryFeeError::feed(format!("Invalid {field} '{text}': {e}"))
            })
        })
        .transpose()
}

fn parse_measurement(field: &str, value: &str) -> Result<Option<f64>> {
    match parse_field::<f64>(field, value)? {
        Some(number) if !number.is_finite() => Err(DeliveryFeeError::feed(format!(
            "Invalid {field} '{}': not a finite number",
            value.trim()
        ))),
        parsed => Ok(parsed),
    }
}

impl StationXml {
    /// Deserialize the inner markup of one `<station>` element
    pub fn parse(content: &str) -> Result<Self> {
        from_str(&format!("<station>{content}</station>"))
            .map_err(|e| DeliveryFeeError::feed(format!("Malformed station entry: {e}")))
    }

    /// Convert a tracked station entry into an observation
    pub fn to_observation(&self, timestamp: DateTime<Utc>) -> Result<StationObservation> {
        let name = non_empty(&self.name)
            .ok_or_else(|| DeliveryFeeError::feed("Station entry without a name"))?;

        Ok(StationObservation {
            id: None,
            station_name: name.to_string(),
            wmo_code: parse_field("wmocode", &self.wmocode)?,
            air_temperature: parse_measurement("airtemperature", &self.airtemperature)?,
            wind_speed: parse_measurement("windspeed", &self.windspeed)?,
            phenomenon: non_empty(&self.phenomenon).map(str::to_string),
            timestamp,
        })
    }
}

/// Parse an observations document into tracked station observations.
///
/// Fails only when the document itself cannot be read. A missing or invalid
/// batch timestamp falls back to the current time.
pub fn normalize(xml_content: &str) -> Result<Vec<StationObservation>> {
    normalize_with_fallback(xml_content, Utc::now)
}

/// [`normalize`] with an explicit clock for the timestamp fallback
pub fn normalize_with_fallback<F>(xml_content: &str, now: F) -> Result<Vec<StationObservation>>
where
    F: FnOnce() -> DateTime<Utc>,
{
    let document = ObservationsDocument::split(xml_content)?;

    let timestamp = match document.batch_timestamp() {
        Ok(timestamp) => timestamp,
        Err(e) => {
            let fallback = now();
            warn!("{e}; using {fallback} as batch timestamp");
            fallback
        }
    };

    let mut observations = Vec::new();
    let mut skipped = 0;

    for content in &document.stations {
        let station = match StationXml::parse(content) {
            Ok(station) => station,
            Err(e) => {
                warn!("Skipping station entry: {}", e);
                skipped += 1;
                continue;
            }
        };
        let Some(name) = non_empty(&station.name) else {
            debug!("Skipping station entry without a name");
            continue;
        };
        if !is_tracked_station(name) {
            continue;
        }

        match station.to_observation(timestamp) {
            Ok(observation) => observations.push(observation),
            Err(e) => {
                warn!("Skipping station entry {}: {}", name, e);
                skipped += 1;
            }
        }
    }

    info!(
        "Normalized {} tracked observations out of {} stations ({} malformed)",
        observations.len(),
        document.stations.len(),
        skipped
    );

    Ok(observations)
}
