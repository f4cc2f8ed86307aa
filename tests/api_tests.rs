use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use deliveryfee::api::{AppState, ErrorBody};
use deliveryfee::store::MemoryObservationStore;
use deliveryfee::{
    BaseFeeTable, DeliveryFeeService, FeeEngine, ObservationStore, StationObservation, web,
};
use http_body_util::BodyExt;
use rstest::rstest;
use tower::ServiceExt;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 6, 12, 0, 0).unwrap()
}

async fn app() -> axum::Router {
    let store = Arc::new(MemoryObservationStore::new());
    store
        .save_all(vec![
            StationObservation::new("Tallinn-Harku", noon() - Duration::hours(1))
                .with_air_temperature(-100.0)
                .with_wind_speed(15.0)
                .with_phenomenon("snow"),
            StationObservation::new("Tallinn-Harku", noon())
                .with_air_temperature(2.0)
                .with_wind_speed(21.0),
            StationObservation::new("Pärnu", noon())
                .with_air_temperature(-3.0)
                .with_wind_speed(5.0)
                .with_phenomenon("Thunderstorm"),
        ])
        .await
        .unwrap();

    let state = AppState {
        service: Arc::new(DeliveryFeeService::new(
            FeeEngine::new(BaseFeeTable::standard().unwrap()),
            store,
        )),
        time_zone: chrono_tz::Europe::Tallinn,
    };
    web::app(state)
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app()
        .await
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

async fn get_fee(uri: &str) -> f64 {
    let (status, body) = get(uri).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

async fn get_error(uri: &str, expected: StatusCode) -> String {
    let (status, body) = get(uri).await;
    assert_eq!(status, expected);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    error.message
}

#[rstest]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Car", 4.0)]
#[case("/api/delivery/fee?city=tallinn&vehicleType=CAR", 4.0)]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Scooter", 3.5)]
#[case("/api/delivery/fee?city=P%C3%A4rnu&vehicleType=Car", 3.0)]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Bike&dateTime=2024-02-06T14:00:00", 5.5)]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Bike&date=2024-02-06T12:00:00Z", 5.5)]
#[tokio::test]
async fn test_fee_is_returned_as_number(#[case] uri: &str, #[case] expected: f64) {
    assert_eq!(get_fee(uri).await, expected);
}

#[rstest]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Bike")]
#[case("/api/delivery/fee?city=P%C3%A4rnu&vehicleType=Scooter")]
#[tokio::test]
async fn test_forbidden_vehicle(#[case] uri: &str) {
    let message = get_error(uri, StatusCode::BAD_REQUEST).await;
    assert_eq!(message, "Usage of selected vehicle type is forbidden");
}

#[rstest]
#[case("/api/delivery/fee?city=Tartu&vehicleType=Car")]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Car&dateTime=2024-02-06T11:00:00Z")]
#[tokio::test]
async fn test_no_weather_data(#[case] uri: &str) {
    let message = get_error(uri, StatusCode::BAD_REQUEST).await;
    assert_eq!(message, "No weather data to calculate fee");
}

#[rstest]
#[case("/api/delivery/fee?vehicleType=Car", "Argument is missing: city")]
#[case("/api/delivery/fee?city=Tallinn", "Argument is missing: vehicleType")]
#[case("/api/delivery/fee?city=&vehicleType=Car", "Argument is missing: city")]
#[tokio::test]
async fn test_missing_argument(#[case] uri: &str, #[case] expected: &str) {
    assert_eq!(get_error(uri, StatusCode::BAD_REQUEST).await, expected);
}

#[rstest]
#[case("/api/delivery/fee?city=Narva&vehicleType=Car")]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Truck")]
#[case("/api/delivery/fee?city=Tallinn&vehicleType=Car&dateTime=tomorrow")]
#[tokio::test]
async fn test_argument_type_mismatch(#[case] uri: &str) {
    let message = get_error(uri, StatusCode::BAD_REQUEST).await;
    assert!(message.starts_with("Argument type mismatch - "), "{message}");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = get("/api/delivery/fees").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
