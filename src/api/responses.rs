use crate::estimation::model::ModelKind;
use crate::features::TrafficLevel;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub model: ModelKind,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GeocodeResponse {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReverseResponse {
    pub display_name: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TrafficResponse {
    pub traffic_level: TrafficLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Body or query string could not be decoded.
    InvalidRequest,
    InvalidInput,
    PlaceNotFound,
    GeocodingUnavailable,
    PredictionFailed,
    InternalError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ErrorCode::PlaceNotFound,
            error_message: "no location found".to_string(),
            timestamp: "2026-01-11T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "PLACE_NOT_FOUND",
                "error_message": "no location found",
                "timestamp": "2026-01-11T12:32:00Z"
            })
        );
    }

    #[test]
    fn health_response_serializes_status_and_model() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Degraded,
            model: ModelKind::Heuristic,
            timestamp: "2026-01-11T12:33:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "degraded",
                "model": "heuristic",
                "timestamp": "2026-01-11T12:33:00Z"
            })
        );
    }

    #[test]
    fn traffic_response_uses_level_name() {
        let value = serde_json::to_value(TrafficResponse {
            traffic_level: TrafficLevel::Medium,
        })
        .expect("serialize traffic response");
        assert_eq!(value, json!({ "traffic_level": "Medium" }));
    }
}
