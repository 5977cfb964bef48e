//! ETA model trait shared by the persisted regressor and the heuristic fallback.
//!
//! The server loads one model at startup and shares it read-only between
//! requests, so implementations must be `Send + Sync` and free of interior
//! mutability.

use crate::features::FeatureVector;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Persisted,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("feature {0} is not a finite number")]
    NonFinite(&'static str),
    #[error("hour of day must be a whole hour in 0-23, got {0}")]
    InvalidHour(f64),
    #[error("distance must be non-negative, got {0} km")]
    NegativeDistance(f64),
    #[error("IsWeekday must be 0 or 1, got {0}")]
    InvalidWeekdayFlag(f64),
    #[error("traffic flags must each be 0 or 1 with at most one set")]
    InvalidTrafficFlags,
    #[error("model produced a non-finite prediction")]
    NonFiniteOutput,
    #[error("regressor failed: {0}")]
    Regressor(String),
}

/// Trait for models that turn a feature vector into predicted travel minutes.
pub trait EtaModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;

    fn kind(&self) -> ModelKind;
}

/// Reject feature vectors that could not have come out of feature construction.
pub fn validate_features(features: &FeatureVector) -> Result<(), PredictionError> {
    let values = features.to_array();
    for (value, name) in values.iter().zip(crate::features::FEATURE_NAMES) {
        if !value.is_finite() {
            return Err(PredictionError::NonFinite(name));
        }
    }

    let hour = features.hour_of_day;
    if !(0.0..=23.0).contains(&hour) || hour.fract() != 0.0 {
        return Err(PredictionError::InvalidHour(hour));
    }
    if features.distance_km < 0.0 {
        return Err(PredictionError::NegativeDistance(features.distance_km));
    }
    if !is_flag(features.is_weekday) {
        return Err(PredictionError::InvalidWeekdayFlag(features.is_weekday));
    }

    let flags = [
        features.traffic_low,
        features.traffic_medium,
        features.traffic_high,
    ];
    if !flags.iter().all(|flag| is_flag(*flag)) || flags.iter().sum::<f64>() > 1.0 {
        return Err(PredictionError::InvalidTrafficFlags);
    }
    Ok(())
}

fn is_flag(value: f64) -> bool {
    value == 0.0 || value == 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{TrafficLevel, TripInputs};

    fn valid() -> FeatureVector {
        let inputs = TripInputs {
            home_lat: 12.97,
            home_lon: 77.59,
            office_lat: 12.93,
            office_lon: 77.61,
            distance_km: 5.0,
            hour_of_day: 18,
            is_weekday: true,
            traffic_level: TrafficLevel::High,
        };
        match FeatureVector::from_inputs(&inputs) {
            Ok(features) => features,
            Err(err) => panic!("valid inputs rejected: {err}"),
        }
    }

    #[test]
    fn constructed_features_pass_validation() {
        assert_eq!(validate_features(&valid()), Ok(()));
    }

    #[test]
    fn two_traffic_flags_are_rejected() {
        let mut features = valid();
        features.traffic_low = 1.0;
        assert_eq!(
            validate_features(&features),
            Err(PredictionError::InvalidTrafficFlags)
        );
    }

    #[test]
    fn fractional_hour_is_rejected() {
        let mut features = valid();
        features.hour_of_day = 7.5;
        assert_eq!(
            validate_features(&features),
            Err(PredictionError::InvalidHour(7.5))
        );
    }

    #[test]
    fn nan_feature_is_named() {
        let mut features = valid();
        features.hour_cos = f64::NAN;
        assert_eq!(
            validate_features(&features),
            Err(PredictionError::NonFinite("HourCos"))
        );
    }

    #[test]
    fn all_flags_clear_is_allowed() {
        let mut features = valid();
        features.traffic_high = 0.0;
        assert_eq!(validate_features(&features), Ok(()));
    }
}
