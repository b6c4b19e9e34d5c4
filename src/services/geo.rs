//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Total length of a polyline in kilometers
pub fn path_length_km(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}

/// Index of the path point nearest to `position` (minimum haversine
/// distance). Returns 0 for an empty slice.
pub fn nearest_point_index(points: &[Coordinates], position: &Coordinates) -> usize {
    let mut best = 0;
    let mut best_distance = f64::MAX;

    for (i, point) in points.iter().enumerate() {
        let d = haversine_distance(point, position);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }

    best
}

/// Linear blend between two coordinates at parameter `t` in [0, 1].
/// Adequate at segment scale; no great-circle correction.
pub fn lerp(from: &Coordinates, to: &Coordinates, t: f64) -> Coordinates {
    Coordinates {
        lat: from.lat + (to.lat - from.lat) * t,
        lng: from.lng + (to.lng - from.lng) * t,
    }
}

/// Smoothstep ease `t²(3−2t)`: zero slope at both ends, so interpolated
/// motion does not read as constant-velocity sliding.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_prague_brno() {
        let prague = Coordinates { lat: 50.0755, lng: 14.4378 };
        let brno = Coordinates { lat: 49.1951, lng: 16.6068 };

        let distance = haversine_distance(&prague, &brno);

        // Prague to Brno is approximately 185 km
        assert!((distance - 185.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates { lat: 50.0, lng: 14.0 };
        let distance = haversine_distance(&point, &point);
        assert!((distance - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_haversine_short_hop() {
        // Scenario from the Saigon district routes: one hundredth of a degree
        // in both axes is roughly 1.5 km at this latitude
        let a = Coordinates { lat: 10.00, lng: 106.00 };
        let b = Coordinates { lat: 10.01, lng: 106.01 };

        let distance = haversine_distance(&a, &b);
        assert!((distance - 1.5).abs() < 0.2, "expected ~1.5 km, got {}", distance);
    }

    #[test]
    fn test_path_length_sums_segments() {
        let points = vec![
            Coordinates { lat: 50.0, lng: 14.0 },
            Coordinates { lat: 50.1, lng: 14.0 },
            Coordinates { lat: 50.2, lng: 14.0 },
        ];

        let total = path_length_km(&points);
        let first = haversine_distance(&points[0], &points[1]);
        let second = haversine_distance(&points[1], &points[2]);
        assert!((total - (first + second)).abs() < 1e-9);
    }

    #[test]
    fn test_path_length_single_point_is_zero() {
        let points = vec![Coordinates { lat: 50.0, lng: 14.0 }];
        assert_eq!(path_length_km(&points), 0.0);
    }

    #[test]
    fn test_nearest_point_index() {
        let points = vec![
            Coordinates { lat: 10.00, lng: 106.00 },
            Coordinates { lat: 10.01, lng: 106.01 },
            Coordinates { lat: 10.02, lng: 106.02 },
        ];

        let near_middle = Coordinates { lat: 10.0101, lng: 106.0099 };
        assert_eq!(nearest_point_index(&points, &near_middle), 1);

        let near_end = Coordinates { lat: 10.03, lng: 106.03 };
        assert_eq!(nearest_point_index(&points, &near_end), 2);
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Coordinates { lat: 10.0, lng: 106.0 };
        let b = Coordinates { lat: 11.0, lng: 107.0 };

        assert_eq!(lerp(&a, &b, 0.0), a);
        assert_eq!(lerp(&a, &b, 1.0), b);

        let mid = lerp(&a, &b, 0.5);
        assert!((mid.lat - 10.5).abs() < 1e-9);
        assert!((mid.lng - 106.5).abs() < 1e-9);
    }

    #[test]
    fn test_smoothstep_shape() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-9);
        // Eases in: below linear in the first half
        assert!(smoothstep(0.25) < 0.25);
        // Eases out: above linear in the second half
        assert!(smoothstep(0.75) > 0.75);
        // Clamped outside the unit interval
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
    }
}
