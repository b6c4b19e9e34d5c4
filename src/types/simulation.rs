//! Per-vehicle simulation state and live position samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Travel direction along a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub const fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Position along a path: the index of the segment base point, the distance
/// already travelled into the segment ahead, and the travel direction.
///
/// `index` is always a valid point index; `offset_km` is zero whenever the
/// position sits exactly on a path point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPosition {
    pub index: usize,
    pub offset_km: f64,
    pub direction: Direction,
}

impl PathPosition {
    pub fn start() -> Self {
        Self {
            index: 0,
            offset_km: 0.0,
            direction: Direction::Forward,
        }
    }

    pub fn at(index: usize) -> Self {
        Self {
            index,
            offset_km: 0.0,
            direction: Direction::Forward,
        }
    }
}

/// Simulation state for one active vehicle. Mutated only by the simulation
/// clock; one instance per active vehicle.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub vehicle_id: Uuid,
    pub route_id: Uuid,
    pub position: PathPosition,
    pub speed_kmh: f64,
    pub last_tick: DateTime<Utc>,
}

/// A live position sample. Ephemeral — the newest sample supersedes older
/// ones per vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSample {
    pub vehicle_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_flipped() {
        assert_eq!(Direction::Forward.flipped(), Direction::Backward);
        assert_eq!(Direction::Backward.flipped(), Direction::Forward);
    }

    #[test]
    fn test_direction_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Direction::Forward).unwrap(), "\"forward\"");
    }

    #[test]
    fn test_path_position_start() {
        let pos = PathPosition::start();
        assert_eq!(pos.index, 0);
        assert_eq!(pos.direction, Direction::Forward);
        assert_eq!(pos.offset_km, 0.0);
    }
}
