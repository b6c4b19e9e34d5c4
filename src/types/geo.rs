//! Geographic primitives

use serde::{Deserialize, Serialize};

/// Coordinates (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_serialize() {
        let c = Coordinates { lat: 10.762622, lng: 106.660172 };
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"lat\":10.762622"));
        assert!(json.contains("\"lng\":106.660172"));
    }

    #[test]
    fn test_coordinates_deserialize() {
        let c: Coordinates = serde_json::from_str(r#"{"lat":50.0755,"lng":14.4378}"#).unwrap();
        assert!((c.lat - 50.0755).abs() < 1e-9);
        assert!((c.lng - 14.4378).abs() < 1e-9);
    }
}
