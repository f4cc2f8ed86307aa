//! Persistence of weather station observations
//!
//! Observations are written by the ingestion task and read when quoting a
//! fee. Lookups pick the most recent observation whose station name contains
//! the city name, ignoring case.

pub mod persistent;
pub mod memory;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::models::{City, StationObservation};

pub use persistent::FjallObservationStore;
pub use memory::MemoryObservationStore;

#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Most recent observation for the city
    async fn find_latest(&self, city: City) -> Result<Option<StationObservation>>;

    /// Most recent observation for the city taken strictly before `before`
    async fn find_latest_before(
        &self,
        city: City,
        before: DateTime<Utc>,
    ) -> Result<Option<StationObservation>>;

    /// Persist observations, returning them with their assigned ids
    async fn save_all(&self, observations: Vec<StationObservation>)
    -> Result<Vec<StationObservation>>;
}

/// Whether `candidate` should replace `current` as the latest pick.
/// Equal timestamps resolve to the later insert.
pub(crate) fn is_newer(candidate: (DateTime<Utc>, u64), current: Option<(DateTime<Utc>, u64)>) -> bool {
    current.is_none_or(|current| candidate > current)
}

/// Pick the latest observation for a city among `observations`
pub fn select_latest<'a, I>(
    observations: I,
    city: City,
    before: Option<DateTime<Utc>>,
) -> Option<&'a StationObservation>
where
    I: IntoIterator<Item = &'a StationObservation>,
{
    let mut latest: Option<&StationObservation> = None;
    for observation in observations {
        if !city.matches_station(&observation.station_name) {
            continue;
        }
        if before.is_some_and(|limit| observation.timestamp >= limit) {
            continue;
        }
        let key = (observation.timestamp, observation.id.unwrap_or_default());
        if is_newer(key, latest.map(|l| (l.timestamp, l.id.unwrap_or_default()))) {
            latest = Some(observation);
        }
    }
    latest
}

/// Open the store backend selected in the configuration
pub fn open(config: &StoreConfig) -> Result<Arc<dyn ObservationStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryObservationStore::new())),
        "fjall" => Ok(Arc::new(FjallObservationStore::open(&config.location)?)),
        other => bail!("Unknown store backend '{other}'"),
    }
}
