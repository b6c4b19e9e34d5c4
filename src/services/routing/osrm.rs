//! Secondary routing provider client (OSRM-compatible API)
//!
//! OSRM route service reference:
//! https://project-osrm.org/docs/v5.24.0/api/#route-service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::DirectionsProvider;
use crate::defaults::PROVIDER_TIMEOUT_SECS;
use crate::error::TrackingError;
use crate::types::Coordinates;

/// OSRM client configuration
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL (e.g. "https://router.project-osrm.org")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// OSRM routing client
pub struct OsrmClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the route request URL. OSRM takes a semicolon-delimited
    /// `lng,lat` path in the URL itself.
    fn build_url(&self, waypoints: &[Coordinates]) -> String {
        let path = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson",
            self.config.base_url, path,
        )
    }
}

#[async_trait]
impl DirectionsProvider for OsrmClient {
    async fn fetch_geometry(&self, waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, TrackingError> {
        let url = self.build_url(waypoints);

        debug!("Requesting OSRM route for {} waypoints", waypoints.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrackingError::provider(self.name(), e))?;

        if !response.status().is_success() {
            return Err(TrackingError::provider(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| TrackingError::provider(self.name(), format!("bad response body: {}", e)))?;

        if body.code != "Ok" {
            return Err(TrackingError::provider(self.name(), format!("code {}", body.code)));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| TrackingError::provider(self.name(), "no routes in response"))?;

        // GeoJSON coordinates are [lng, lat]
        let points: Vec<Coordinates> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|pair| Coordinates { lat: pair[1], lng: pair[0] })
            .collect();

        if points.is_empty() {
            return Err(TrackingError::provider(self.name(), "empty geometry"));
        }

        debug!("OSRM returned {} geometry points", points.len());
        Ok(points)
    }

    fn name(&self) -> &str {
        "Osrm"
    }
}

// OSRM API types

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_delimited_lng_lat_pairs() {
        let client = OsrmClient::new(OsrmConfig::new("https://router.project-osrm.org"));
        let waypoints = vec![
            Coordinates { lat: 10.0, lng: 106.0 },
            Coordinates { lat: 10.01, lng: 106.01 },
        ];

        let url = client.build_url(&waypoints);
        assert!(url.contains("/route/v1/driving/106,10;106.01,10.01"));
        assert!(url.contains("geometries=geojson"));
    }

    #[test]
    fn test_response_coordinates_flip_to_lat_lng() {
        let json = r#"{
            "code": "Ok",
            "routes": [{"geometry": {"coordinates": [[106.0, 10.0], [106.01, 10.01]]}}]
        }"#;

        let body: OsrmResponse = serde_json::from_str(json).unwrap();
        let route = body.routes.into_iter().next().unwrap();
        assert!((route.geometry.coordinates[0][0] - 106.0).abs() < 1e-9);
    }

    #[tokio::test]
    #[ignore = "Requires network access to the public OSRM demo server"]
    async fn test_osrm_integration_short_route() {
        let client = OsrmClient::new(OsrmConfig::new("https://router.project-osrm.org"));
        let waypoints = vec![
            Coordinates { lat: 52.517, lng: 13.388 },
            Coordinates { lat: 52.529, lng: 13.397 },
        ];

        let points = client.fetch_geometry(&waypoints).await.unwrap();
        assert!(points.len() > 2, "expected a dense path, got {}", points.len());
    }
}
