use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Database, Keyspace};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;

use super::{ObservationStore, is_newer};
use crate::models::{City, StationObservation};

const SEQUENCE_KEY: &[u8] = b"sequence";
const STATIONS_KEY: &[u8] = b"stations";
const TIMESTAMP_SIGN: u64 = 1 << 63;

fn observation_key(id: u64) -> Vec<u8> {
    let mut key = b"obs/".to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// `station/<name>` plus a zero byte, so no station's keys fall under
/// another station's prefix
fn station_prefix(station_name: &str) -> Vec<u8> {
    let mut key = format!("station/{station_name}").into_bytes();
    key.push(0);
    key
}

/// Timestamp as 12 bytes that sort like the timestamps they encode
fn encode_timestamp(timestamp: DateTime<Utc>) -> [u8; 12] {
    let seconds = (timestamp.timestamp() as u64) ^ TIMESTAMP_SIGN;
    let mut bytes = [0u8; 12];
    bytes[..8].copy_from_slice(&seconds.to_be_bytes());
    bytes[8..].copy_from_slice(&timestamp.timestamp_subsec_nanos().to_be_bytes());
    bytes
}

fn index_key(station_name: &str, timestamp: DateTime<Utc>, id: u64) -> Vec<u8> {
    let mut key = station_prefix(station_name);
    key.extend_from_slice(&encode_timestamp(timestamp));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Observation store persisted in a fjall keyspace
///
/// Layout:
/// - `obs/<id>`: the observation, postcard encoded
/// - `station/<name>\0<timestamp><id>`: time index, value is the id
/// - `stations`: every station name seen so far
/// - `sequence`: last assigned id
///
/// One `save_all` is committed as a single write batch.
pub struct FjallObservationStore {
    db: Database,
    store: Keyspace,
    write_lock: Mutex<()>,
}

fn read<T: DeserializeOwned>(store: &Keyspace, key: &[u8]) -> Result<Option<T>> {
    match store.get(key)?.map(|v| v.to_vec()) {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Id of the newest index entry of a station, strictly before `before` if given
fn last_indexed_id(
    store: &Keyspace,
    station_name: &str,
    before: Option<DateTime<Utc>>,
) -> Result<Option<u64>> {
    let prefix = station_prefix(station_name);
    let last = match before {
        Some(limit) => {
            let mut upper = prefix.clone();
            upper.extend_from_slice(&encode_timestamp(limit));
            store.range(prefix..upper).next_back()
        }
        None => store.prefix(&prefix).next_back(),
    };

    match last {
        Some(entry) => {
            let value = entry.value()?;
            let id = <[u8; 8]>::try_from(&*value)
                .with_context(|| format!("Corrupt index entry for station {station_name}"))?;
            Ok(Some(u64::from_be_bytes(id)))
        }
        None => Ok(None),
    }
}

fn find_latest_blocking(
    store: &Keyspace,
    city: City,
    before: Option<DateTime<Utc>>,
) -> Result<Option<StationObservation>> {
    let stations: Vec<String> = read(store, STATIONS_KEY)?.unwrap_or_default();

    let mut latest: Option<StationObservation> = None;
    for station in stations.iter().filter(|name| city.matches_station(name)) {
        let Some(id) = last_indexed_id(store, station, before)? else {
            continue;
        };
        let observation: StationObservation = read(store, &observation_key(id))?
            .ok_or_else(|| anyhow!("Observation {id} is indexed but missing"))?;

        let current = latest
            .as_ref()
            .map(|l| (l.timestamp, l.id.unwrap_or_default()));
        if is_newer((observation.timestamp, id), current) {
            latest = Some(observation);
        }
    }

    Ok(latest)
}

fn save_all_blocking(
    db: &Database,
    store: &Keyspace,
    observations: Vec<StationObservation>,
) -> Result<Vec<StationObservation>> {
    let mut last_id: u64 = read(store, SEQUENCE_KEY)?.unwrap_or(0);
    let mut stations: Vec<String> = read(store, STATIONS_KEY)?.unwrap_or_default();
    let mut batch = db.batch();
    let mut saved = Vec::with_capacity(observations.len());

    for mut observation in observations {
        last_id += 1;
        observation.id = Some(last_id);

        batch.insert(store, observation_key(last_id), postcard::to_stdvec(&observation)?);
        batch.insert(
            store,
            index_key(&observation.station_name, observation.timestamp, last_id),
            last_id.to_be_bytes(),
        );
        if !stations.contains(&observation.station_name) {
            stations.push(observation.station_name.clone());
        }
        saved.push(observation);
    }

    batch.insert(store, SEQUENCE_KEY, postcard::to_stdvec(&last_id)?);
    batch.insert(store, STATIONS_KEY, postcard::to_stdvec(&stations)?);
    batch.commit()?;

    Ok(saved)
}

impl FjallObservationStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::builder(path)
            .open()
            .with_context(|| format!("Failed to open observation store at {}", path.display()))?;
        let observations = db.keyspace("observations", fjall::KeyspaceCreateOptions::default)?;
        tracing::info!("Opened observation store at {}", path.display());
        Ok(FjallObservationStore {
            db,
            store: observations,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl ObservationStore for FjallObservationStore {
    #[tracing::instrument(name = "find_latest", level = "debug", skip(self))]
    async fn find_latest(&self, city: City) -> Result<Option<StationObservation>> {
        let store = self.store.clone();
        task::spawn_blocking(move || find_latest_blocking(&store, city, None)).await?
    }

    #[tracing::instrument(name = "find_latest_before", level = "debug", skip(self))]
    async fn find_latest_before(
        &self,
        city: City,
        before: DateTime<Utc>,
    ) -> Result<Option<StationObservation>> {
        let store = self.store.clone();
        task::spawn_blocking(move || find_latest_blocking(&store, city, Some(before))).await?
    }

    #[tracing::instrument(name = "save_observations", level = "debug", skip_all, fields(count = observations.len()))]
    async fn save_all(
        &self,
        observations: Vec<StationObservation>,
    ) -> Result<Vec<StationObservation>> {
        let _guard = self.write_lock.lock().await;
        let db = self.db.clone();
        let store = self.store.clone();
        let saved =
            task::spawn_blocking(move || save_all_blocking(&db, &store, observations)).await??;
        tracing::debug!("Stored {} observations", saved.len());
        Ok(saved)
    }
}
