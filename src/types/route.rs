//! Route and stop types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coordinates;

/// A stop on a route. The ordered sequence of stops is the canonical stop
/// order for the route; coordinates may be missing for stops that were never
/// geocoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPoint {
    pub stop_id: Uuid,
    pub name: String,
    /// Position in the route (0-based)
    pub order: u32,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Route reference data pushed in by the platform (read-only here)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub route_id: Uuid,
    pub name: String,
    /// Stops sorted by `order`
    pub stops: Vec<StopPoint>,
}

impl RouteRecord {
    /// Waypoints for geometry resolution: coordinates of geocoded stops,
    /// in stop order.
    pub fn waypoints(&self) -> Vec<Coordinates> {
        self.stops.iter().filter_map(|s| s.coordinates).collect()
    }
}

/// A resolved road-following path for a route. Immutable once resolved;
/// cached per route for the process lifetime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePath {
    pub route_id: Uuid,
    /// Dense ordered polyline, at least one point
    pub points: Vec<Coordinates>,
    pub total_distance_km: f64,
}

impl RoutePath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_point_deserialize_without_coordinates() {
        let json = r#"{
            "stopId": "123e4567-e89b-12d3-a456-426614174000",
            "name": "Main St & 5th",
            "order": 2
        }"#;

        let stop: StopPoint = serde_json::from_str(json).unwrap();
        assert_eq!(stop.name, "Main St & 5th");
        assert_eq!(stop.order, 2);
        assert!(stop.coordinates.is_none());
    }

    #[test]
    fn test_route_record_waypoints_skip_ungeocoded_stops() {
        let route = RouteRecord {
            route_id: Uuid::nil(),
            name: "Morning North".to_string(),
            stops: vec![
                StopPoint {
                    stop_id: Uuid::new_v4(),
                    name: "A".to_string(),
                    order: 0,
                    coordinates: Some(Coordinates::new(10.0, 106.0)),
                },
                StopPoint {
                    stop_id: Uuid::new_v4(),
                    name: "B".to_string(),
                    order: 1,
                    coordinates: None,
                },
                StopPoint {
                    stop_id: Uuid::new_v4(),
                    name: "C".to_string(),
                    order: 2,
                    coordinates: Some(Coordinates::new(10.01, 106.01)),
                },
            ],
        };

        let waypoints = route.waypoints();
        assert_eq!(waypoints.len(), 2);
        assert!((waypoints[1].lat - 10.01).abs() < 1e-9);
    }
}
