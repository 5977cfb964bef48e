use crate::config::ServiceSettings;
use crate::geo::GeoPoint;
use crate::services::{
    MapServices, Place, ProviderEstimate, RouteWaypoints, ServiceError, parse_directions_response,
    parse_reverse_response, parse_route_response, parse_search_response,
};
use reqwest::Client;
use std::fmt;

/// [`MapServices`] over Nominatim, OSRM and the Ola Maps directions API.
#[derive(Clone)]
pub struct HttpMapServices {
    client: Client,
    settings: ServiceSettings,
}

impl HttpMapServices {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn has_distance_provider(&self) -> bool {
        self.settings.distance_api_key.is_some()
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ServiceError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

impl fmt::Debug for HttpMapServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMapServices")
            .field("geocoding_url", &self.settings.geocoding_url)
            .field("routing_url", &self.settings.routing_url)
            .field("distance_url", &self.settings.distance_url)
            .field("has_distance_provider", &self.has_distance_provider())
            .field("timeout", &self.settings.timeout)
            .finish()
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

impl MapServices for HttpMapServices {
    async fn geocode(&self, query: &str) -> Result<Option<Place>, ServiceError> {
        let url = endpoint(&self.settings.geocoding_url, "search");
        let params = [
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        let body = self.get_text(&url, &params).await?;
        parse_search_response(&body, query)
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, ServiceError> {
        let url = endpoint(&self.settings.geocoding_url, "reverse");
        let params = [
            ("format", "json".to_string()),
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
        ];
        let body = self.get_text(&url, &params).await?;
        parse_reverse_response(&body)
    }

    async fn route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> Result<Option<RouteWaypoints>, ServiceError> {
        let url = endpoint(
            &self.settings.routing_url,
            &format!(
                "route/v1/driving/{},{};{},{}",
                start.lon, start.lat, end.lon, end.lat
            ),
        );
        let params = [
            ("overview", "full".to_string()),
            ("geometries", "geojson".to_string()),
        ];
        let body = self.get_text(&url, &params).await?;
        parse_route_response(&body)
    }

    async fn distance_and_eta(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> Result<Option<ProviderEstimate>, ServiceError> {
        let Some(api_key) = self.settings.distance_api_key.as_ref() else {
            return Ok(None);
        };
        let url = endpoint(&self.settings.distance_url, "routing/v1/directions");
        let params = [
            ("origin", format!("{},{}", start.lat, start.lon)),
            ("destination", format!("{},{}", end.lat, end.lon)),
            ("api_key", api_key.clone()),
        ];
        let body = self.get_text(&url, &params).await?;
        parse_directions_response(&body).map(Some)
    }
}
