//! Rule-of-thumb ETA used when no trained model artifact can be loaded.
//!
//! Formula: `minutes = distance_km * traffic_factor * rush_hour_multiplier`

use crate::estimation::model::{EtaModel, ModelKind, PredictionError, validate_features};
use crate::features::FeatureVector;

pub const NO_TRAFFIC_FACTOR: f64 = 1.0;
pub const LOW_TRAFFIC_FACTOR: f64 = 1.5;
pub const MEDIUM_TRAFFIC_FACTOR: f64 = 2.0;
pub const HIGH_TRAFFIC_FACTOR: f64 = 3.0;
pub const RUSH_HOUR_MULTIPLIER: f64 = 1.2;

/// Minutes per kilometre for the traffic flag that is set, 1.0 when none is.
pub fn traffic_factor(features: &FeatureVector) -> f64 {
    if features.traffic_low == 1.0 {
        LOW_TRAFFIC_FACTOR
    } else if features.traffic_medium == 1.0 {
        MEDIUM_TRAFFIC_FACTOR
    } else if features.traffic_high == 1.0 {
        HIGH_TRAFFIC_FACTOR
    } else {
        NO_TRAFFIC_FACTOR
    }
}

/// Morning 08-10 and evening 17-19, both inclusive.
pub fn is_rush_hour(hour_of_day: f64) -> bool {
    (8.0..=10.0).contains(&hour_of_day) || (17.0..=19.0).contains(&hour_of_day)
}

pub fn heuristic_minutes(features: &FeatureVector) -> f64 {
    let rush_multiplier = if is_rush_hour(features.hour_of_day) {
        RUSH_HOUR_MULTIPLIER
    } else {
        1.0
    };
    features.distance_km * traffic_factor(features) * rush_multiplier
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicModel;

impl EtaModel for HeuristicModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        validate_features(features)?;
        Ok(heuristic_minutes(features))
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Heuristic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{TrafficLevel, TripInputs};
    use crate::error::ValidationError;

    fn features(
        distance_km: f64,
        hour_of_day: u8,
        traffic_level: TrafficLevel,
    ) -> Result<FeatureVector, ValidationError> {
        FeatureVector::from_inputs(&TripInputs {
            home_lat: 12.97,
            home_lon: 77.59,
            office_lat: 12.93,
            office_lon: 77.61,
            distance_km,
            hour_of_day,
            is_weekday: true,
            traffic_level,
        })
    }

    #[test]
    fn high_traffic_rush_hour_reference_case() -> Result<(), Box<dyn std::error::Error>> {
        let minutes = HeuristicModel.predict(&features(10.0, 9, TrafficLevel::High)?)?;
        assert!((minutes - 36.0).abs() < 1e-9, "got {minutes}");
        Ok(())
    }

    #[test]
    fn off_peak_low_traffic() -> Result<(), Box<dyn std::error::Error>> {
        let minutes = HeuristicModel.predict(&features(10.0, 14, TrafficLevel::Low)?)?;
        assert!((minutes - 15.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn rush_hour_bounds_are_inclusive() {
        assert!(!is_rush_hour(7.0));
        assert!(is_rush_hour(8.0));
        assert!(is_rush_hour(10.0));
        assert!(!is_rush_hour(11.0));
        assert!(is_rush_hour(17.0));
        assert!(is_rush_hour(19.0));
        assert!(!is_rush_hour(20.0));
    }

    #[test]
    fn unset_traffic_uses_unit_factor() -> Result<(), ValidationError> {
        let mut vector = features(4.0, 12, TrafficLevel::Medium)?;
        vector.traffic_medium = 0.0;

        assert_eq!(traffic_factor(&vector), NO_TRAFFIC_FACTOR);
        assert_eq!(heuristic_minutes(&vector), 4.0);
        Ok(())
    }

    #[test]
    fn malformed_vector_is_rejected() -> Result<(), ValidationError> {
        let mut vector = features(4.0, 12, TrafficLevel::Medium)?;
        vector.distance_km = -3.0;

        assert_eq!(
            HeuristicModel.predict(&vector),
            Err(PredictionError::NegativeDistance(-3.0))
        );
        Ok(())
    }

    #[test]
    fn reports_heuristic_kind() {
        assert_eq!(HeuristicModel.kind(), ModelKind::Heuristic);
    }
}
