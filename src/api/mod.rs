use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::DeliveryFeeError;
use crate::fees::DeliveryFeeService;
use crate::models::{City, VehicleType};

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DeliveryFeeService>,
    /// Zone for request timestamps given without an offset
    pub time_zone: Tz,
}

#[derive(Debug, Deserialize)]
pub struct FeeQuery {
    pub city: Option<String>,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "dateTime", alias = "date")]
    pub date_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl IntoResponse for DeliveryFeeError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {self}");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorBody {
            timestamp: Utc::now(),
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/delivery/fee", get(get_delivery_fee))
        .with_state(state)
}

fn required<'a>(name: &str, value: Option<&'a str>) -> crate::Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DeliveryFeeError::validation(format!("Argument is missing: {name}")))
}

fn parse_argument<T>(value: &str) -> crate::Result<T>
where
    T: FromStr<Err = DeliveryFeeError>,
{
    value.parse::<T>().map_err(|e| {
        DeliveryFeeError::validation(format!("Argument type mismatch - {}", e.user_message()))
    })
}

/// Parse an ISO-8601 timestamp. Values without an offset are local time in `zone`.
pub fn parse_timestamp(value: &str, zone: Tz) -> crate::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let naive = value
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|e| {
            DeliveryFeeError::validation(format!(
                "Argument type mismatch - invalid date-time '{value}': {e}"
            ))
        })?;

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            DeliveryFeeError::validation(format!(
                "Argument type mismatch - '{value}' does not exist in {zone}"
            ))
        })
}

async fn get_delivery_fee(
    State(state): State<AppState>,
    Query(query): Query<FeeQuery>,
) -> Result<Json<f64>, DeliveryFeeError> {
    let city: City = parse_argument(required("city", query.city.as_deref())?)?;
    let vehicle: VehicleType =
        parse_argument(required("vehicleType", query.vehicle_type.as_deref())?)?;
    let at = match query.date_time.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_timestamp(raw, state.time_zone)?),
        _ => None,
    };

    let fee = state.service.delivery_fee(city, vehicle, at).await?;
    Ok(Json(fee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Tallinn;
    use rstest::rstest;

    #[rstest]
    #[case("2024-02-06T12:00:00Z", "2024-02-06T12:00:00Z")]
    #[case("2024-02-06T14:00:00+02:00", "2024-02-06T12:00:00Z")]
    #[case("2024-02-06T14:00:00", "2024-02-06T12:00:00Z")]
    #[case("2024-02-06T14:00", "2024-02-06T12:00:00Z")]
    #[case("2024-02-06T14:00:00.500", "2024-02-06T12:00:00.500Z")]
    #[case("2024-07-06T14:00:00", "2024-07-06T11:00:00Z")]
    fn test_parse_timestamp(#[case] raw: &str, #[case] expected: &str) {
        let expected = DateTime::parse_from_rfc3339(expected).unwrap().with_timezone(&Utc);
        assert_eq!(parse_timestamp(raw, Tallinn).unwrap(), expected);
    }

    #[rstest]
    #[case("yesterday")]
    #[case("2024-02-30T10:00:00")]
    #[case("2024-03-31T03:30:00")]
    fn test_parse_timestamp_rejects(#[case] raw: &str) {
        let err = parse_timestamp(raw, Tallinn).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.user_message().starts_with("Argument type mismatch"));
    }

    #[test]
    fn test_required_argument() {
        assert_eq!(required("city", Some(" Tartu ")).unwrap(), "Tartu");
        let err = required("city", Some("  ")).unwrap_err();
        assert_eq!(err.user_message(), "Argument is missing: city");
        assert!(required("vehicleType", None).is_err());
    }

    #[test]
    fn test_argument_mismatch_message() {
        let err = parse_argument::<VehicleType>("plane").unwrap_err();
        assert!(err.user_message().starts_with("Argument type mismatch - Unknown vehicle type 'plane'"));
    }
}
