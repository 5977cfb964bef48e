//! Feature construction shared by training and serving.
//!
//! Both sides must produce the same columns in the same order; the order is
//! recorded in every model artifact as [`FEATURE_NAMES`].

use crate::error::ValidationError;
use serde::Serialize;
use std::f64::consts::PI;

pub mod batch;
pub mod traffic;

pub use traffic::{DayOfWeek, TrafficLevel, get_traffic_level};

pub const FEATURE_COUNT: usize = 12;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "HomeLat",
    "HomeLon",
    "OfficeLat",
    "OfficeLon",
    "DistanceKM",
    "HourOfDay",
    "IsWeekday",
    "HourSin",
    "HourCos",
    "Traffic_Low",
    "Traffic_Medium",
    "Traffic_High",
];

/// Fully specified trip attributes for a single prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripInputs {
    pub home_lat: f64,
    pub home_lon: f64,
    pub office_lat: f64,
    pub office_lon: f64,
    pub distance_km: f64,
    pub hour_of_day: u8,
    pub is_weekday: bool,
    pub traffic_level: TrafficLevel,
}

/// Model input row. Field order matches [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub home_lat: f64,
    pub home_lon: f64,
    pub office_lat: f64,
    pub office_lon: f64,
    pub distance_km: f64,
    pub hour_of_day: f64,
    pub is_weekday: f64,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub traffic_low: f64,
    pub traffic_medium: f64,
    pub traffic_high: f64,
}

impl FeatureVector {
    pub fn from_inputs(inputs: &TripInputs) -> Result<Self, ValidationError> {
        assemble(
            [
                inputs.home_lat,
                inputs.home_lon,
                inputs.office_lat,
                inputs.office_lon,
            ],
            inputs.distance_km,
            f64::from(inputs.hour_of_day),
            inputs.is_weekday,
            inputs.traffic_level,
        )
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.home_lat,
            self.home_lon,
            self.office_lat,
            self.office_lon,
            self.distance_km,
            self.hour_of_day,
            self.is_weekday,
            self.hour_sin,
            self.hour_cos,
            self.traffic_low,
            self.traffic_medium,
            self.traffic_high,
        ]
    }

    /// The level whose flag is set, or `None` when no flag is set.
    pub fn traffic_level(&self) -> Option<TrafficLevel> {
        let flags = [self.traffic_low, self.traffic_medium, self.traffic_high];
        TrafficLevel::ALL
            .into_iter()
            .zip(flags)
            .find(|(_, flag)| *flag == 1.0)
            .map(|(level, _)| level)
    }
}

/// Sine/cosine encoding of the hour so that 23:00 and 00:00 sit next to each other.
pub fn hour_encoding(hour_of_day: f64) -> (f64, f64) {
    let angle = 2.0 * PI * hour_of_day / 24.0;
    (angle.sin(), angle.cos())
}

/// One-hot flags in [`TrafficLevel::ALL`] order. Exactly one flag is 1.
pub fn traffic_one_hot(level: TrafficLevel) -> [f64; 3] {
    TrafficLevel::ALL.map(|candidate| if candidate == level { 1.0 } else { 0.0 })
}

pub(crate) fn validate_hour(hour_of_day: f64) -> Result<(), ValidationError> {
    if !hour_of_day.is_finite() {
        return Err(ValidationError::NonFinite("HourOfDay"));
    }
    if !(0.0..=23.0).contains(&hour_of_day) {
        return Err(ValidationError::HourOutOfRange(hour_of_day));
    }
    if hour_of_day.fract() != 0.0 {
        return Err(ValidationError::FractionalHour(hour_of_day));
    }
    Ok(())
}

pub(crate) fn validate_distance(distance_km: f64) -> Result<(), ValidationError> {
    if !distance_km.is_finite() {
        return Err(ValidationError::NonFinite("DistanceKM"));
    }
    if distance_km < 0.0 {
        return Err(ValidationError::NegativeDistance(distance_km));
    }
    Ok(())
}

fn assemble(
    coordinates: [f64; 4],
    distance_km: f64,
    hour_of_day: f64,
    is_weekday: bool,
    traffic_level: TrafficLevel,
) -> Result<FeatureVector, ValidationError> {
    validate_hour(hour_of_day)?;
    validate_distance(distance_km)?;
    for (value, name) in coordinates.iter().zip(FEATURE_NAMES) {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(name));
        }
    }

    let [home_lat, home_lon, office_lat, office_lon] = coordinates;
    let (hour_sin, hour_cos) = hour_encoding(hour_of_day);
    let [traffic_low, traffic_medium, traffic_high] = traffic_one_hot(traffic_level);

    Ok(FeatureVector {
        home_lat,
        home_lon,
        office_lat,
        office_lon,
        distance_km,
        hour_of_day,
        is_weekday: if is_weekday { 1.0 } else { 0.0 },
        hour_sin,
        hour_cos,
        traffic_low,
        traffic_medium,
        traffic_high,
    })
}
