//! Per-request trip pipeline: resolve locations and departure time, infer
//! traffic, pick a distance, predict, and compute the arrival clock time.
//!
//! All request state lives in a [`TripContext`] built for the request and
//! dropped with it.

use crate::error::{AppError, ValidationError};
use crate::estimation::model::{EtaModel, ModelKind};
use crate::features::{DayOfWeek, FeatureVector, TrafficLevel, TripInputs, get_traffic_level};
use crate::geo::GeoPoint;
use crate::services::{MapServices, RouteWaypoints, UNKNOWN_LOCATION};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Time};
use tracing::{debug, warn};

pub mod clock;

use clock::{arrival_time, departure_from, format_clock, parse_time_of_day};

/// Either a free-text place name or explicit coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Place { place: String },
    Coordinates { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeInput {
    #[default]
    Current,
    Custom {
        /// `HH:MM`, 24-hour clock.
        time: String,
        day_of_week: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripRequest {
    pub start: LocationInput,
    pub end: LocationInput,
    #[serde(default)]
    pub time: TimeInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

impl ResolvedLocation {
    fn new(point: GeoPoint, display_name: String) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            display_name,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripContext {
    pub start: ResolvedLocation,
    pub end: ResolvedLocation,
    pub departure: Time,
    pub day: DayOfWeek,
    pub traffic_level: TrafficLevel,
}

impl TripContext {
    /// `now` is only consulted for `TimeInput::Current`.
    pub async fn resolve<S: MapServices>(
        request: &TripRequest,
        services: &S,
        now: OffsetDateTime,
    ) -> Result<Self, AppError> {
        let (departure, day) = resolve_time(&request.time, now)?;
        let start = resolve_location(&request.start, services).await?;
        let end = resolve_location(&request.end, services).await?;
        let traffic_level = get_traffic_level(departure.hour(), day);

        Ok(Self {
            start,
            end,
            departure,
            day,
            traffic_level,
        })
    }

    pub fn is_weekday(&self) -> bool {
        self.day.is_weekday()
    }
}

fn resolve_time(input: &TimeInput, now: OffsetDateTime) -> Result<(Time, DayOfWeek), ValidationError> {
    match input {
        TimeInput::Current => Ok(departure_from(now)),
        TimeInput::Custom { time, day_of_week } => {
            Ok((parse_time_of_day(time)?, day_of_week.parse()?))
        }
    }
}

async fn resolve_location<S: MapServices>(
    input: &LocationInput,
    services: &S,
) -> Result<ResolvedLocation, AppError> {
    match input {
        LocationInput::Place { place } => {
            let query = place.trim();
            if query.is_empty() {
                return Err(ValidationError::EmptyPlace.into());
            }
            match services.geocode(query).await {
                Ok(Some(found)) => Ok(ResolvedLocation::new(found.point, found.display_name)),
                Ok(None) => Err(AppError::PlaceNotFound(query.to_string())),
                Err(err) => {
                    warn!(place = %query, error = %err, "Geocoding failed");
                    Err(AppError::GeocodingUnavailable(err))
                }
            }
        }
        LocationInput::Coordinates { lat, lon } => {
            let point = GeoPoint::new(*lat, *lon)?;
            Ok(ResolvedLocation::new(point, display_name_for(point, services).await))
        }
    }
}

/// Reverse-geocoded name, or [`UNKNOWN_LOCATION`] when the lookup fails.
pub async fn display_name_for<S: MapServices>(point: GeoPoint, services: &S) -> String {
    match services.reverse_geocode(point).await {
        Ok(name) => name,
        Err(err) => {
            warn!(lat = point.lat, lon = point.lon, error = %err, "Reverse geocoding failed");
            UNKNOWN_LOCATION.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSource {
    Provider,
    Haversine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEstimate {
    pub predicted_minutes: f64,
    pub departure_time: String,
    pub arrival_time: String,
    pub distance_km: f64,
    pub distance_source: DistanceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_eta_minutes: Option<f64>,
    pub traffic_level: TrafficLevel,
    pub day_of_week: DayOfWeek,
    pub is_weekday: bool,
    pub model: ModelKind,
    pub model_accuracy: String,
    pub start: ResolvedLocation,
    pub end: ResolvedLocation,
}

/// Run the model for a resolved trip. Provider failures fall back to the
/// great-circle distance and never fail the estimate.
pub async fn estimate_trip<S: MapServices>(
    context: &TripContext,
    model: &dyn EtaModel,
    services: &S,
    model_accuracy: &str,
) -> Result<TripEstimate, AppError> {
    let start = context.start.point();
    let end = context.end.point();

    let provider = match services.distance_and_eta(start, end).await {
        Ok(estimate) => estimate,
        Err(err) => {
            warn!(error = %err, "Distance provider failed, using haversine distance");
            None
        }
    };
    let (distance_km, distance_source, api_eta_minutes) = match provider {
        Some(estimate) => (
            estimate.distance_km,
            DistanceSource::Provider,
            Some(estimate.eta_minutes),
        ),
        None => (start.distance_to(&end), DistanceSource::Haversine, None),
    };

    let features = FeatureVector::from_inputs(&TripInputs {
        home_lat: start.lat,
        home_lon: start.lon,
        office_lat: end.lat,
        office_lon: end.lon,
        distance_km,
        hour_of_day: context.departure.hour(),
        is_weekday: context.is_weekday(),
        traffic_level: context.traffic_level,
    })?;
    let predicted_minutes = model.predict(&features)?;
    let arrival = arrival_time(context.departure, predicted_minutes)?;

    debug!(
        distance_km,
        predicted_minutes,
        traffic = %context.traffic_level,
        model = ?model.kind(),
        "Trip estimated"
    );

    Ok(TripEstimate {
        predicted_minutes,
        departure_time: format_clock(context.departure)?,
        arrival_time: format_clock(arrival)?,
        distance_km,
        distance_source,
        api_eta_minutes,
        traffic_level: context.traffic_level,
        day_of_week: context.day,
        is_weekday: context.is_weekday(),
        model: model.kind(),
        model_accuracy: model_accuracy.to_string(),
        start: context.start.clone(),
        end: context.end.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    pub waypoints: RouteWaypoints,
    /// True when no road route was available and the path is start to end.
    pub straight_line: bool,
}

pub async fn route_between<S: MapServices>(services: &S, start: GeoPoint, end: GeoPoint) -> RoutePath {
    match services.route(start, end).await {
        Ok(Some(waypoints)) if !waypoints.is_empty() => RoutePath {
            waypoints,
            straight_line: false,
        },
        Ok(_) => straight_line(start, end),
        Err(err) => {
            warn!(error = %err, "Routing failed, drawing straight line");
            straight_line(start, end)
        }
    }
}

fn straight_line(start: GeoPoint, end: GeoPoint) -> RoutePath {
    RoutePath {
        waypoints: vec![[start.lon, start.lat], [end.lon, end.lat]],
        straight_line: true,
    }
}
