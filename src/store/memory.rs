use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObservationStore, select_latest};
use crate::models::{City, StationObservation};

#[derive(Default)]
struct Inner {
    observations: Vec<StationObservation>,
    last_id: u64,
}

/// Process-local store, used for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryObservationStore {
    inner: RwLock<Inner>,
}

impl MemoryObservationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.observations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn find_latest(&self, city: City) -> Result<Option<StationObservation>> {
        let inner = self.inner.read().await;
        Ok(select_latest(&inner.observations, city, None).cloned())
    }

    async fn find_latest_before(
        &self,
        city: City,
        before: DateTime<Utc>,
    ) -> Result<Option<StationObservation>> {
        let inner = self.inner.read().await;
        Ok(select_latest(&inner.observations, city, Some(before)).cloned())
    }

    async fn save_all(
        &self,
        observations: Vec<StationObservation>,
    ) -> Result<Vec<StationObservation>> {
        let mut inner = self.inner.write().await;
        let mut saved = Vec::with_capacity(observations.len());
        for mut observation in observations {
            inner.last_id += 1;
            observation.id = Some(inner.last_id);
            inner.observations.push(observation.clone());
            saved.push(observation);
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_save_assigns_ids_and_queries_latest() {
        let store = MemoryObservationStore::new();
        let earlier = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let later = earlier + Duration::minutes(10);

        let saved = store
            .save_all(vec![
                StationObservation::new("Tallinn-Harku", earlier).with_air_temperature(-3.0),
                StationObservation::new("Tallinn-Harku", later).with_air_temperature(-4.0),
                StationObservation::new("Pärnu", later),
            ])
            .await
            .unwrap();

        assert_eq!(saved.iter().map(|o| o.id).collect::<Vec<_>>(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(store.len().await, 3);

        let latest = store.find_latest(City::Tallinn).await.unwrap().unwrap();
        assert_eq!(latest.air_temperature, Some(-4.0));

        let before = store.find_latest_before(City::Tallinn, later).await.unwrap().unwrap();
        assert_eq!(before.air_temperature, Some(-3.0));

        assert!(store.find_latest(City::Tartu).await.unwrap().is_none());
    }
}
