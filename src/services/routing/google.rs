//! Primary directions provider client (Google-Directions-compatible API)
//!
//! Directions API reference:
//! https://developers.google.com/maps/documentation/directions

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::polyline::decode_polyline;
use super::DirectionsProvider;
use crate::defaults::PROVIDER_TIMEOUT_SECS;
use crate::error::TrackingError;
use crate::types::Coordinates;

/// Primary provider configuration
#[derive(Debug, Clone)]
pub struct GoogleDirectionsConfig {
    /// Base URL (e.g. "https://maps.googleapis.com")
    pub base_url: String,
    /// API key; requests without one are refused before hitting the network
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GoogleDirectionsConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            timeout_seconds: PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// Primary directions client
pub struct GoogleDirectionsClient {
    client: Client,
    config: GoogleDirectionsConfig,
}

impl GoogleDirectionsClient {
    pub fn new(config: GoogleDirectionsConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the directions request URL. Coordinates go in the provider's
    /// native `lat,lng` order; intermediate waypoints are pipe-delimited.
    fn build_url(&self, waypoints: &[Coordinates], key: &str) -> String {
        let origin = &waypoints[0];
        let destination = &waypoints[waypoints.len() - 1];

        let mut url = format!(
            "{}/maps/api/directions/json?origin={},{}&destination={},{}",
            self.config.base_url, origin.lat, origin.lng, destination.lat, destination.lng,
        );

        if waypoints.len() > 2 {
            let via = waypoints[1..waypoints.len() - 1]
                .iter()
                .map(|c| format!("{},{}", c.lat, c.lng))
                .collect::<Vec<_>>()
                .join("|");
            url.push_str(&format!("&waypoints={}", urlencoding::encode(&via)));
        }

        url.push_str(&format!("&key={}", urlencoding::encode(key)));
        url
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    async fn fetch_geometry(&self, waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, TrackingError> {
        let key = self.config.api_key.as_deref().ok_or_else(|| {
            TrackingError::Configuration("primary directions provider has no API key".to_string())
        })?;

        let url = self.build_url(waypoints, key);

        debug!("Requesting directions for {} waypoints", waypoints.len());

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

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| TrackingError::provider(self.name(), format!("bad response body: {}", e)))?;

        if body.status != "OK" {
            return Err(TrackingError::provider(
                self.name(),
                format!("status {}", body.status),
            ));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| TrackingError::provider(self.name(), "no routes in response"))?;

        let points = route
            .geometry()
            .map_err(|e| TrackingError::provider(self.name(), e))?;

        if points.is_empty() {
            return Err(TrackingError::provider(self.name(), "empty geometry"));
        }

        debug!("Primary provider returned {} geometry points", points.len());
        Ok(points)
    }

    fn name(&self) -> &str {
        "GoogleDirections"
    }
}

// Provider API types

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

/// One route alternative. Depending on the deployment the geometry arrives
/// either as an encoded overview polyline or as an explicit coordinate
/// array; both must be detected.
#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    overview_path: Option<Vec<LatLng>>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl DirectionsRoute {
    fn geometry(self) -> Result<Vec<Coordinates>, String> {
        if let Some(path) = self.overview_path {
            return Ok(path
                .into_iter()
                .map(|p| Coordinates { lat: p.lat, lng: p.lng })
                .collect());
        }

        match self.overview_polyline {
            Some(encoded) => decode_polyline(&encoded.points, 5).map_err(|e| e.to_string()),
            None => Err("route carries neither coordinate array nor polyline".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_key() -> GoogleDirectionsClient {
        GoogleDirectionsClient::new(GoogleDirectionsConfig::new(
            "https://maps.googleapis.com",
            Some("test-key".to_string()),
        ))
    }

    #[test]
    fn test_build_url_two_waypoints() {
        let client = client_with_key();
        let waypoints = vec![
            Coordinates { lat: 10.0, lng: 106.0 },
            Coordinates { lat: 10.01, lng: 106.01 },
        ];

        let url = client.build_url(&waypoints, "test-key");
        assert!(url.contains("origin=10,106"));
        assert!(url.contains("destination=10.01,106.01"));
        assert!(!url.contains("waypoints="));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn test_build_url_intermediate_waypoints_pipe_delimited() {
        let client = client_with_key();
        let waypoints = vec![
            Coordinates { lat: 10.0, lng: 106.0 },
            Coordinates { lat: 10.005, lng: 106.005 },
            Coordinates { lat: 10.01, lng: 106.01 },
        ];

        let url = client.build_url(&waypoints, "test-key");
        // Pipe is percent-encoded in the waypoints parameter
        assert!(url.contains("waypoints=10.005%2C106.005"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = GoogleDirectionsClient::new(GoogleDirectionsConfig::new(
            "https://maps.googleapis.com",
            None,
        ));
        let waypoints = vec![
            Coordinates { lat: 10.0, lng: 106.0 },
            Coordinates { lat: 10.01, lng: 106.01 },
        ];

        let err = client.fetch_geometry(&waypoints).await.unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_response_decodes_encoded_polyline() {
        let json = r#"{
            "status": "OK",
            "routes": [{"overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"}}]
        }"#;

        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        let points = body.routes.into_iter().next().unwrap().geometry().unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].lat - 38.5).abs() < 1e-5);
    }

    #[test]
    fn test_response_detects_explicit_coordinate_array() {
        let json = r#"{
            "status": "OK",
            "routes": [{"overview_path": [
                {"lat": 10.0, "lng": 106.0},
                {"lat": 10.01, "lng": 106.01}
            ]}]
        }"#;

        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        let points = body.routes.into_iter().next().unwrap().geometry().unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[1].lng - 106.01).abs() < 1e-9);
    }

    #[test]
    fn test_response_without_geometry_errors() {
        let json = r#"{"status": "OK", "routes": [{}]}"#;
        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert!(body.routes.into_iter().next().unwrap().geometry().is_err());
    }
}
