//! Route geometry resolution
//!
//! Turns an ordered stop/waypoint list into a dense road-following path.
//! Providers are tried in order; when every tier fails the resolver falls
//! back to local interpolation, so callers never see a provider error.

mod google;
mod osrm;
pub mod polyline;

pub use google::{GoogleDirectionsClient, GoogleDirectionsConfig};
pub use osrm::{OsrmClient, OsrmConfig};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::defaults::INTERPOLATION_SPACING_KM;
use crate::error::TrackingError;
use crate::services::geo::{haversine_distance, lerp, path_length_km, smoothstep};
use crate::types::{Coordinates, RoutePath};

/// One tier of the directions fallback chain
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Fetch road-following geometry through the given waypoints, in order
    async fn fetch_geometry(&self, waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, TrackingError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Resolves route geometry through an ordered provider chain with a local
/// interpolation fallback. Infallible by contract.
pub struct RouteGeometryResolver {
    providers: Vec<Box<dyn DirectionsProvider>>,
}

impl RouteGeometryResolver {
    pub fn new(providers: Vec<Box<dyn DirectionsProvider>>) -> Self {
        Self { providers }
    }

    /// Build the production chain from configuration: primary directions
    /// provider, then the free OSRM-compatible router.
    pub fn from_config(config: &Config) -> Self {
        info!(
            "Directions chain: primary={}, fallback={}",
            if config.directions_api_key.is_some() { "enabled" } else { "no key" },
            config.osrm_url,
        );

        Self::new(vec![
            Box::new(GoogleDirectionsClient::new(GoogleDirectionsConfig::new(
                &config.directions_url,
                config.directions_api_key.clone(),
            ))),
            Box::new(OsrmClient::new(OsrmConfig::new(&config.osrm_url))),
        ])
    }

    /// Resolve a path through `waypoints`. Never fails: exhausting every
    /// provider still yields a usable interpolated path.
    pub async fn resolve(&self, route_id: Uuid, waypoints: &[Coordinates]) -> RoutePath {
        if waypoints.len() < 2 {
            debug!(
                "Route {}: {}, returning input unchanged",
                route_id,
                TrackingError::DegenerateRoute { count: waypoints.len() },
            );
            return path_from_points(route_id, waypoints.to_vec());
        }

        for provider in &self.providers {
            match provider.fetch_geometry(waypoints).await {
                Ok(points) => {
                    debug!(
                        "Route {} resolved by {} with {} points",
                        route_id,
                        provider.name(),
                        points.len(),
                    );
                    return path_from_points(route_id, points);
                }
                Err(e) => {
                    warn!("Route {}: {} failed, trying next tier: {}", route_id, provider.name(), e);
                }
            }
        }

        info!("Route {}: all providers failed, using interpolated geometry", route_id);
        path_from_points(route_id, interpolate_waypoints(waypoints))
    }
}

fn path_from_points(route_id: Uuid, points: Vec<Coordinates>) -> RoutePath {
    let total_distance_km = path_length_km(&points);
    RoutePath {
        route_id,
        points,
        total_distance_km,
    }
}

/// Final fallback: subdivide each waypoint pair proportionally to its
/// great-circle length (at least one point per 100 m), easing the blend
/// with smoothstep. Every input waypoint appears in the output, in order.
/// Fewer than two waypoints are returned unchanged.
pub fn interpolate_waypoints(waypoints: &[Coordinates]) -> Vec<Coordinates> {
    if waypoints.len() < 2 {
        return waypoints.to_vec();
    }

    let mut points = vec![waypoints[0]];

    for pair in waypoints.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let distance = haversine_distance(from, to);
        let steps = (distance / INTERPOLATION_SPACING_KM).ceil().max(1.0) as usize;

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            points.push(lerp(from, to, smoothstep(t)));
        }
    }

    points
}
