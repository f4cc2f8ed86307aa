use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{FeeEngine, FeeRejection};
use crate::models::{City, StationObservation, VehicleType};
use crate::store::ObservationStore;
use crate::{DeliveryFeeError, Result};

/// Quotes delivery fees against the stored weather observations
pub struct DeliveryFeeService {
    engine: FeeEngine,
    store: Arc<dyn ObservationStore>,
}

impl DeliveryFeeService {
    pub fn new(engine: FeeEngine, store: Arc<dyn ObservationStore>) -> Self {
        Self { engine, store }
    }

    /// Find the observation a fee is priced against: the latest one, or the
    /// latest one strictly before `at`
    async fn resolve_observation(
        &self,
        city: City,
        at: Option<DateTime<Utc>>,
    ) -> Result<StationObservation> {
        let found = match at {
            Some(at) => self.store.find_latest_before(city, at).await,
            None => self.store.find_latest(city).await,
        }
        .map_err(|e| DeliveryFeeError::store(format!("{e:#}")))?;

        found.ok_or_else(|| FeeRejection::NoWeatherData.into())
    }

    #[instrument(skip(self))]
    pub async fn delivery_fee(
        &self,
        city: City,
        vehicle: VehicleType,
        at: Option<DateTime<Utc>>,
    ) -> Result<f64> {
        let observation = self.resolve_observation(city, at).await?;
        let breakdown = self.engine.breakdown(city, vehicle, &observation)?;

        debug!(
            station = %observation.station_name,
            observed_at = %observation.timestamp,
            ?breakdown,
            "Calculated delivery fee"
        );

        Ok(breakdown.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaseFeeTable;
    use crate::store::MemoryObservationStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    struct BrokenStore;

    #[async_trait]
    impl ObservationStore for BrokenStore {
        async fn find_latest(&self, _city: City) -> anyhow::Result<Option<StationObservation>> {
            Err(anyhow!("disk unavailable"))
        }

        async fn find_latest_before(
            &self,
            _city: City,
            _before: DateTime<Utc>,
        ) -> anyhow::Result<Option<StationObservation>> {
            Err(anyhow!("disk unavailable"))
        }

        async fn save_all(
            &self,
            _observations: Vec<StationObservation>,
        ) -> anyhow::Result<Vec<StationObservation>> {
            Err(anyhow!("disk unavailable"))
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 6, 12, 0, 0).unwrap()
    }

    async fn service_with(observations: Vec<StationObservation>) -> DeliveryFeeService {
        let store = Arc::new(MemoryObservationStore::new());
        store.save_all(observations).await.unwrap();
        DeliveryFeeService::new(FeeEngine::new(BaseFeeTable::standard().unwrap()), store)
    }

    #[tokio::test]
    async fn test_fee_uses_latest_observation() {
        let service = service_with(vec![
            StationObservation::new("Tallinn-Harku", noon() - Duration::hours(1))
                .with_air_temperature(-100.0)
                .with_wind_speed(15.0)
                .with_phenomenon("snow"),
            StationObservation::new("Tallinn-Harku", noon())
                .with_air_temperature(5.0)
                .with_wind_speed(2.0),
        ])
        .await;

        let fee = service.delivery_fee(City::Tallinn, VehicleType::Bike, None).await.unwrap();
        assert_eq!(fee, 3.0);
    }

    #[tokio::test]
    async fn test_fee_at_past_time_uses_earlier_observation() {
        let service = service_with(vec![
            StationObservation::new("Tallinn-Harku", noon() - Duration::hours(1))
                .with_air_temperature(-100.0)
                .with_wind_speed(15.0)
                .with_phenomenon("snow"),
            StationObservation::new("Tallinn-Harku", noon()).with_air_temperature(5.0),
        ])
        .await;

        let fee = service
            .delivery_fee(City::Tallinn, VehicleType::Bike, Some(noon()))
            .await
            .unwrap();
        assert_eq!(fee, 5.5);
    }

    #[tokio::test]
    async fn test_no_observation_is_rejected() {
        let service = service_with(vec![StationObservation::new("Pärnu", noon())]).await;

        let result = service.delivery_fee(City::Tartu, VehicleType::Car, None).await;
        assert!(matches!(
            result,
            Err(DeliveryFeeError::Rejected(FeeRejection::NoWeatherData))
        ));

        let result = service
            .delivery_fee(City::Parnu, VehicleType::Car, Some(noon()))
            .await;
        assert!(matches!(
            result,
            Err(DeliveryFeeError::Rejected(FeeRejection::NoWeatherData))
        ));
    }

    #[tokio::test]
    async fn test_forbidden_vehicle_is_rejected() {
        let service = service_with(vec![
            StationObservation::new("Tallinn-Harku", noon()).with_wind_speed(21.0),
        ])
        .await;

        let result = service.delivery_fee(City::Tallinn, VehicleType::Bike, None).await;
        assert!(matches!(
            result,
            Err(DeliveryFeeError::Rejected(FeeRejection::VehicleForbidden))
        ));

        let fee = service.delivery_fee(City::Tallinn, VehicleType::Car, None).await.unwrap();
        assert_eq!(fee, 4.0);
    }

    #[tokio::test]
    async fn test_store_failure_is_a_store_error() {
        let service = DeliveryFeeService::new(
            FeeEngine::new(BaseFeeTable::standard().unwrap()),
            Arc::new(BrokenStore),
        );

        let result = service.delivery_fee(City::Tallinn, VehicleType::Car, None).await;
        let err = result.unwrap_err();
        assert!(matches!(err, DeliveryFeeError::Store { .. }));
        assert!(!err.is_client_error());
    }
}
