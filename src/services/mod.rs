//! Outbound map collaborators: geocoding, reverse geocoding, routing and the
//! distance/ETA provider.
//!
//! The serving path only sees the [`MapServices`] trait so handlers can be
//! exercised against in-memory stubs. Response bodies are decoded by the
//! `parse_*` functions, which are independent of the transport.

use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub mod http;

pub use http::HttpMapServices;

/// Display name used when reverse geocoding fails.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Payload(String),
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub point: GeoPoint,
    pub display_name: String,
}

/// Road distance and travel time reported by the distance provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProviderEstimate {
    pub distance_km: f64,
    pub eta_minutes: f64,
}

/// Route geometry as `[lon, lat]` pairs, the order routing services use.
pub type RouteWaypoints = Vec<[f64; 2]>;

pub trait MapServices: Send + Sync {
    /// First match for a free-text place name, `None` when nothing matches.
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<Place>, ServiceError>> + Send;

    fn reverse_geocode(
        &self,
        point: GeoPoint,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Driving route, `None` when the router has no route between the points.
    fn route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> impl Future<Output = Result<Option<RouteWaypoints>, ServiceError>> + Send;

    /// `None` when no provider credential is configured.
    fn distance_and_eta(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> impl Future<Output = Result<Option<ProviderEstimate>, ServiceError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

pub fn parse_search_response(body: &str, query: &str) -> Result<Option<Place>, ServiceError> {
    let hits: Vec<SearchHit> = decode(body)?;
    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };
    let lat = parse_coordinate(&hit.lat)?;
    let lon = parse_coordinate(&hit.lon)?;
    let point = GeoPoint::new(lat, lon).map_err(|err| ServiceError::Payload(err.to_string()))?;
    Ok(Some(Place {
        point,
        display_name: hit.display_name.unwrap_or_else(|| query.to_string()),
    }))
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

pub fn parse_reverse_response(body: &str) -> Result<String, ServiceError> {
    let response: ReverseResponse = decode(body)?;
    Ok(response
        .display_name
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()))
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: RouteWaypoints,
}

pub fn parse_route_response(body: &str) -> Result<Option<RouteWaypoints>, ServiceError> {
    let response: RouteResponse = decode(body)?;
    if response.code != "Ok" {
        return Ok(None);
    }
    Ok(response
        .routes
        .into_iter()
        .next()
        .map(|route| route.geometry.coordinates))
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    /// Metres.
    distance: f64,
    /// Seconds.
    duration: f64,
}

pub fn parse_directions_response(body: &str) -> Result<ProviderEstimate, ServiceError> {
    let response: DirectionsResponse = decode(body)?;
    if response.status.as_deref() != Some("success") {
        return Err(ServiceError::Payload(format!(
            "directions status {:?}",
            response.status
        )));
    }
    let route = response
        .routes
        .first()
        .ok_or_else(|| ServiceError::Payload("directions response has no routes".to_string()))?;
    let estimate = ProviderEstimate {
        distance_km: route.distance / 1000.0,
        eta_minutes: route.duration / 60.0,
    };
    if !(estimate.distance_km.is_finite() && estimate.distance_km >= 0.0) {
        return Err(ServiceError::Payload(format!(
            "invalid route distance {}",
            route.distance
        )));
    }
    Ok(estimate)
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|err| ServiceError::Payload(err.to_string()))
}

fn parse_coordinate(raw: &str) -> Result<f64, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::Payload(format!("invalid coordinate {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_takes_first_hit() -> Result<(), ServiceError> {
        let body = r#"[
            {"lat": "12.9716", "lon": "77.5946", "display_name": "MG Road, Bengaluru"},
            {"lat": "0", "lon": "0", "display_name": "elsewhere"}
        ]"#;

        let place = parse_search_response(body, "MG Road")?;

        let place = place.ok_or(ServiceError::Payload("no place".into()))?;
        assert_eq!(place.point, GeoPoint { lat: 12.9716, lon: 77.5946 });
        assert_eq!(place.display_name, "MG Road, Bengaluru");
        Ok(())
    }

    #[test]
    fn empty_search_is_not_found() -> Result<(), ServiceError> {
        assert_eq!(parse_search_response("[]", "nowhere")?, None);
        Ok(())
    }

    #[test]
    fn search_without_display_name_uses_query() -> Result<(), ServiceError> {
        let body = r#"[{"lat": "12.9352", "lon": "77.6146"}]"#;
        let place = parse_search_response(body, "Electronic City")?;
        assert_eq!(
            place.map(|p| p.display_name),
            Some("Electronic City".to_string())
        );
        Ok(())
    }

    #[test]
    fn malformed_coordinate_is_payload_error() {
        let body = r#"[{"lat": "north", "lon": "77.6"}]"#;
        assert!(matches!(
            parse_search_response(body, "x"),
            Err(ServiceError::Payload(_))
        ));
    }

    #[test]
    fn reverse_without_name_is_unknown_location() -> Result<(), ServiceError> {
        assert_eq!(
            parse_reverse_response(r#"{"error": "Unable to geocode"}"#)?,
            UNKNOWN_LOCATION
        );
        assert_eq!(
            parse_reverse_response(r#"{"display_name": "Koramangala"}"#)?,
            "Koramangala"
        );
        Ok(())
    }

    #[test]
    fn route_geometry_is_lon_lat() -> Result<(), ServiceError> {
        let body = r#"{
            "code": "Ok",
            "routes": [{"geometry": {"type": "LineString",
                "coordinates": [[77.5946, 12.9716], [77.60, 12.95], [77.6146, 12.9352]]}}]
        }"#;

        let waypoints = parse_route_response(body)?;

        assert_eq!(
            waypoints,
            Some(vec![[77.5946, 12.9716], [77.60, 12.95], [77.6146, 12.9352]])
        );
        Ok(())
    }

    #[test]
    fn route_without_ok_code_is_none() -> Result<(), ServiceError> {
        assert_eq!(parse_route_response(r#"{"code": "NoRoute"}"#)?, None);
        Ok(())
    }

    #[test]
    fn directions_convert_units() -> Result<(), ServiceError> {
        let body = r#"{"status": "success", "routes": [{"distance": 12500, "duration": 1800}]}"#;

        let estimate = parse_directions_response(body)?;

        assert_eq!(
            estimate,
            ProviderEstimate {
                distance_km: 12.5,
                eta_minutes: 30.0
            }
        );
        Ok(())
    }

    #[test]
    fn failed_directions_status_is_error() {
        let body = r#"{"status": "error", "routes": []}"#;
        assert!(matches!(
            parse_directions_response(body),
            Err(ServiceError::Payload(_))
        ));
    }
}
