use crate::estimation::model::PredictionError;
use crate::services::ServiceError;
use thiserror::Error;

/// Rejected user or dataset input. Surfaced to the caller, never coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("hour of day out of range: {0} (expected 0-23)")]
    HourOutOfRange(f64),
    #[error("hour of day must be a whole hour, got {0}")]
    FractionalHour(f64),
    #[error("distance must be non-negative, got {0} km")]
    NegativeDistance(f64),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("IsWeekday must be 0 or 1, got {0}")]
    InvalidWeekdayFlag(f64),
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
    #[error("unknown day of week: {0:?}")]
    UnknownDay(String),
    #[error("unknown traffic level: {0:?}")]
    UnknownTrafficLevel(String),
    #[error("invalid time of day: {0:?} (expected HH:MM)")]
    InvalidTime(String),
    #[error("place name must not be empty")]
    EmptyPlace,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no location found for {0:?}")]
    PlaceNotFound(String),
    #[error("geocoding service unavailable: {0}")]
    GeocodingUnavailable(#[source] ServiceError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error("failed to format time: {0}")]
    TimeFormat(#[from] time::error::Format),
}
