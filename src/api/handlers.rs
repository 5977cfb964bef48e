use crate::api::responses::{
    ErrorCode, ErrorResponse, GeocodeResponse, HealthStatus, HealthSuccessResponse,
    ReverseResponse, TrafficResponse,
};
use crate::error::{AppError, ValidationError};
use crate::estimation::model::ModelKind;
use crate::features::{DayOfWeek, get_traffic_level};
use crate::geo::GeoPoint;
use crate::services::MapServices;
use crate::state::AppState;
use crate::trip::clock::now_local;
use crate::trip::{RoutePath, TripContext, TripEstimate, TripRequest, display_name_for, route_between};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrafficQuery {
    pub hour: u8,
    pub day: String,
}

pub async fn get_health<S: MapServices>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResponse<HealthSuccessResponse> {
    build_health_response(&state, OffsetDateTime::now_utc())
}

pub async fn post_predict<S: MapServices>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> ApiResponse<TripEstimate> {
    let now = now_local();
    match payload {
        Ok(Json(request)) => build_predict_response(&state, &request, now).await,
        Err(rejection) => rejection_response(rejection.status(), rejection.body_text(), now),
    }
}

pub async fn get_geocode<S: MapServices>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<GeocodeQuery>, QueryRejection>,
) -> ApiResponse<GeocodeResponse> {
    let now = OffsetDateTime::now_utc();
    match query {
        Ok(Query(query)) => build_geocode_response(&state, &query.q, now).await,
        Err(rejection) => rejection_response(rejection.status(), rejection.body_text(), now),
    }
}

pub async fn get_reverse<S: MapServices>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ReverseQuery>, QueryRejection>,
) -> ApiResponse<ReverseResponse> {
    let now = OffsetDateTime::now_utc();
    match query {
        Ok(Query(query)) => build_reverse_response(&state, &query, now).await,
        Err(rejection) => rejection_response(rejection.status(), rejection.body_text(), now),
    }
}

pub async fn get_route<S: MapServices>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> ApiResponse<RoutePath> {
    let now = OffsetDateTime::now_utc();
    match query {
        Ok(Query(query)) => build_route_response(&state, &query, now).await,
        Err(rejection) => rejection_response(rejection.status(), rejection.body_text(), now),
    }
}

pub async fn get_traffic(
    query: Result<Query<TrafficQuery>, QueryRejection>,
) -> ApiResponse<TrafficResponse> {
    let now = OffsetDateTime::now_utc();
    match query {
        Ok(Query(query)) => build_traffic_response(&query, now),
        Err(rejection) => rejection_response(rejection.status(), rejection.body_text(), now),
    }
}

fn build_health_response<S>(
    state: &AppState<S>,
    now: OffsetDateTime,
) -> ApiResponse<HealthSuccessResponse> {
    let model = state.model_kind();
    let status = match model {
        ModelKind::Persisted => HealthStatus::Ok,
        ModelKind::Heuristic => HealthStatus::Degraded,
    };
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(HealthSuccessResponse {
            status,
            model,
            timestamp,
        }),
        Err(_err) => internal_error("timestamp formatting failure"),
    }
}

async fn build_predict_response<S: MapServices>(
    state: &AppState<S>,
    request: &TripRequest,
    now: OffsetDateTime,
) -> ApiResponse<TripEstimate> {
    let context = match TripContext::resolve(request, state.services(), now).await {
        Ok(context) => context,
        Err(err) => return app_error_response(&err, now),
    };
    match crate::trip::estimate_trip(
        &context,
        state.model(),
        state.services(),
        state.model_accuracy(),
    )
    .await
    {
        Ok(estimate) => ApiResponse::Success(estimate),
        Err(err) => app_error_response(&err, now),
    }
}

async fn build_geocode_response<S: MapServices>(
    state: &AppState<S>,
    query: &str,
    now: OffsetDateTime,
) -> ApiResponse<GeocodeResponse> {
    let query = query.trim();
    if query.is_empty() {
        return app_error_response(&ValidationError::EmptyPlace.into(), now);
    }
    match state.services().geocode(query).await {
        Ok(Some(place)) => ApiResponse::Success(GeocodeResponse {
            lat: place.point.lat,
            lon: place.point.lon,
            display_name: place.display_name,
        }),
        Ok(None) => app_error_response(&AppError::PlaceNotFound(query.to_string()), now),
        Err(err) => {
            warn!(place = %query, error = %err, "Geocoding failed");
            app_error_response(&AppError::GeocodingUnavailable(err), now)
        }
    }
}

async fn build_reverse_response<S: MapServices>(
    state: &AppState<S>,
    query: &ReverseQuery,
    now: OffsetDateTime,
) -> ApiResponse<ReverseResponse> {
    match GeoPoint::new(query.lat, query.lon) {
        Ok(point) => ApiResponse::Success(ReverseResponse {
            display_name: display_name_for(point, state.services()).await,
        }),
        Err(err) => app_error_response(&err.into(), now),
    }
}

async fn build_route_response<S: MapServices>(
    state: &AppState<S>,
    query: &RouteQuery,
    now: OffsetDateTime,
) -> ApiResponse<RoutePath> {
    let points = GeoPoint::new(query.start_lat, query.start_lon)
        .and_then(|start| Ok((start, GeoPoint::new(query.end_lat, query.end_lon)?)));
    match points {
        Ok((start, end)) => ApiResponse::Success(route_between(state.services(), start, end).await),
        Err(err) => app_error_response(&err.into(), now),
    }
}

fn build_traffic_response(query: &TrafficQuery, now: OffsetDateTime) -> ApiResponse<TrafficResponse> {
    if query.hour > 23 {
        let err = ValidationError::HourOutOfRange(f64::from(query.hour));
        return app_error_response(&err.into(), now);
    }
    match query.day.parse::<DayOfWeek>() {
        Ok(day) => ApiResponse::Success(TrafficResponse {
            traffic_level: get_traffic_level(query.hour, day),
        }),
        Err(err) => app_error_response(&err.into(), now),
    }
}

fn app_error_response<T>(err: &AppError, now: OffsetDateTime) -> ApiResponse<T> {
    let (status, error_code) = match err {
        AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::InvalidInput),
        AppError::PlaceNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::PlaceNotFound),
        AppError::GeocodingUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::GeocodingUnavailable)
        }
        AppError::Prediction(err) => {
            error!(error = %err, "Prediction failed");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::PredictionFailed)
        }
        AppError::TimeFormat(err) => {
            error!(error = %err, "Time formatting failed");
            return internal_error("time formatting failure");
        }
    };
    error_response(status, error_code, err.to_string(), now)
}

fn rejection_response<T>(status: StatusCode, message: String, now: OffsetDateTime) -> ApiResponse<T> {
    error_response(status, ErrorCode::InvalidRequest, message, now)
}

fn error_response<T>(
    status: StatusCode,
    error_code: ErrorCode,
    error_message: String,
    now: OffsetDateTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message,
                timestamp,
            },
        },
        Err(_err) => internal_error("timestamp formatting failure"),
    }
}

fn internal_error<T>(message: &str) -> ApiResponse<T> {
    error!(message = message, "Internal error while handling request");
    let formatted = format_timestamp(OffsetDateTime::now_utc()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.format(&Rfc3339)
}
