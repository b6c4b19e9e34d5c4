//! Arrival estimation
//!
//! Produces per-remaining-stop ETAs from a live position sample and the
//! route's ordered stop list. The scheduled baseline is the schedule start
//! plus a distance-proportional allocation — a simplified single-baseline
//! approximation, not an authored per-stop timetable.

use chrono::Duration;

use crate::defaults::{ASSUMED_AVERAGE_SPEED_KMH, ON_TIME_TOLERANCE_MINUTES};
use crate::services::alerts;
use crate::services::geo::{haversine_distance, nearest_point_index};
use crate::types::{
    ArrivalReport, Classification, Coordinates, LiveSample, RouteRecord, Schedule, StopEta,
    StopPoint,
};

/// Computes arrival estimates against an assumed average travel speed,
/// distinct from the instantaneous simulated speed.
#[derive(Debug, Clone)]
pub struct ArrivalEstimator {
    assumed_speed_kmh: f64,
}

impl Default for ArrivalEstimator {
    fn default() -> Self {
        Self {
            assumed_speed_kmh: ASSUMED_AVERAGE_SPEED_KMH,
        }
    }
}

impl ArrivalEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assumed_speed(assumed_speed_kmh: f64) -> Self {
        Self { assumed_speed_kmh }
    }

    /// Build the full arrival report for one live sample. Stops without
    /// coordinates cannot be estimated and are skipped.
    pub fn build_report(&self, sample: &LiveSample, route: &RouteRecord, schedule: &Schedule) -> ArrivalReport {
        let stops = self.remaining_etas(sample, &route.stops, schedule);
        let overall_on_time = !stops.iter().any(|s| s.classification == Classification::Delayed);
        let alerts = alerts::candidates(&stops);

        ArrivalReport {
            vehicle_id: sample.vehicle_id,
            route_id: route.route_id,
            schedule_id: schedule.schedule_id,
            current_sample: sample.clone(),
            stops,
            overall_on_time,
            alerts,
        }
    }

    /// ETAs for every stop not yet passed: the live position projects onto
    /// the nearest stop, and every stop at or after it qualifies.
    pub fn remaining_etas(&self, sample: &LiveSample, stops: &[StopPoint], schedule: &Schedule) -> Vec<StopEta> {
        let usable: Vec<(&StopPoint, Coordinates)> = stops
            .iter()
            .filter_map(|s| s.coordinates.map(|c| (s, c)))
            .collect();

        if usable.is_empty() {
            return Vec::new();
        }

        // Distance of each stop from the first stop, along the stop sequence.
        // Basis for the single-baseline scheduled times.
        let mut from_start = Vec::with_capacity(usable.len());
        let mut acc = 0.0;
        from_start.push(0.0);
        for pair in usable.windows(2) {
            acc += haversine_distance(&pair[0].1, &pair[1].1);
            from_start.push(acc);
        }

        let position = Coordinates { lat: sample.lat, lng: sample.lng };
        let stop_coords: Vec<Coordinates> = usable.iter().map(|(_, c)| *c).collect();
        let nearest = nearest_point_index(&stop_coords, &position);

        let departure = schedule.departure();
        let mut etas = Vec::with_capacity(usable.len() - nearest);
        let mut cumulative = 0.0;
        let mut previous = position;

        for (i, (stop, coords)) in usable.iter().enumerate().skip(nearest) {
            cumulative += haversine_distance(&previous, coords);
            previous = *coords;

            let estimated_arrival = sample.timestamp + self.travel_time(cumulative);
            let scheduled_time = departure + self.travel_time(from_start[i]);
            let delay_minutes = (estimated_arrival - scheduled_time).num_minutes();

            let classification = if delay_minutes > ON_TIME_TOLERANCE_MINUTES {
                Classification::Delayed
            } else if delay_minutes < -ON_TIME_TOLERANCE_MINUTES {
                Classification::Early
            } else {
                Classification::OnTime
            };

            etas.push(StopEta {
                stop_id: stop.stop_id,
                name: stop.name.clone(),
                order: stop.order,
                scheduled_time: Some(scheduled_time),
                estimated_arrival,
                cumulative_distance_km: cumulative,
                delay_minutes: Some(delay_minutes),
                classification,
            });
        }

        etas
    }

    fn travel_time(&self, distance_km: f64) -> Duration {
        Duration::milliseconds((distance_km / self.assumed_speed_kmh * 3_600_000.0) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use uuid::Uuid;

    fn stop(order: u32, lat: f64, lng: f64) -> StopPoint {
        StopPoint {
            stop_id: Uuid::new_v4(),
            name: format!("Stop {}", order + 1),
            order,
            coordinates: Some(Coordinates { lat, lng }),
        }
    }

    /// Five stops heading north, ~1.1 km apart
    fn five_stops() -> Vec<StopPoint> {
        (0..5).map(|i| stop(i, 10.0 + i as f64 * 0.01, 106.0)).collect()
    }

    fn schedule_at(start: NaiveTime) -> Schedule {
        Schedule {
            schedule_id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            operating_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: start,
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    fn sample_at(lat: f64, lng: f64, timestamp: chrono::DateTime<Utc>) -> LiveSample {
        LiveSample {
            vehicle_id: Uuid::new_v4(),
            lat,
            lng,
            speed_kmh: 40.0,
            timestamp,
        }
    }

    #[test]
    fn test_remaining_stops_from_nearest_projection() {
        let estimator = ArrivalEstimator::new();
        let stops = five_stops();
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        // Just south of the third stop
        let sample = sample_at(10.019, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 10, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas.len(), 3);
        assert_eq!(etas[0].name, "Stop 3");
        assert_eq!(etas[1].name, "Stop 4");
        assert_eq!(etas[2].name, "Stop 5");
    }

    #[test]
    fn test_cumulative_distance_monotonic() {
        let estimator = ArrivalEstimator::with_assumed_speed(30.0);
        let stops = five_stops();
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas.len(), 5);
        for pair in etas.windows(2) {
            assert!(
                pair[1].cumulative_distance_km >= pair[0].cumulative_distance_km,
                "cumulative distance must be non-decreasing",
            );
        }
    }

    #[test]
    fn test_twelve_minutes_late_classified_delayed() {
        let estimator = ArrivalEstimator::new();
        // Single stop exactly at the sampled position: the ETA is the sample
        // timestamp itself
        let stops = vec![stop(0, 10.0, 106.0)];
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 12, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas.len(), 1);
        assert_eq!(etas[0].delay_minutes, Some(12));
        assert_eq!(etas[0].classification, Classification::Delayed);
    }

    #[test]
    fn test_ahead_of_schedule_classified_early() {
        let estimator = ArrivalEstimator::new();
        let stops = vec![stop(0, 10.0, 106.0)];
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 7, 52, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas[0].delay_minutes, Some(-8));
        assert_eq!(etas[0].classification, Classification::Early);
    }

    #[test]
    fn test_within_tolerance_is_on_time() {
        let estimator = ArrivalEstimator::new();
        let stops = vec![stop(0, 10.0, 106.0)];
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 4, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas[0].classification, Classification::OnTime);
    }

    #[test]
    fn test_stops_without_coordinates_are_skipped() {
        let estimator = ArrivalEstimator::new();
        let mut stops = five_stops();
        stops[1].coordinates = None;
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
        let etas = estimator.remaining_etas(&sample, &stops, &schedule);

        assert_eq!(etas.len(), 4);
        assert!(etas.iter().all(|e| e.name != "Stop 2"));
    }

    #[test]
    fn test_no_usable_stops_yields_empty_report() {
        let estimator = ArrivalEstimator::new();
        let stops = vec![StopPoint {
            stop_id: Uuid::new_v4(),
            name: "Ungeocoded".to_string(),
            order: 0,
            coordinates: None,
        }];
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let route = RouteRecord {
            route_id: schedule.route_id,
            name: "Empty".to_string(),
            stops,
        };

        let sample = sample_at(10.0, 106.0, Utc::now());
        let report = estimator.build_report(&sample, &route, &schedule);

        assert!(report.stops.is_empty());
        assert!(report.overall_on_time);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_report_overall_on_time_requires_no_delayed_stop() {
        let estimator = ArrivalEstimator::new();
        let schedule = schedule_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let route = RouteRecord {
            route_id: schedule.route_id,
            name: "Morning North".to_string(),
            stops: five_stops(),
        };

        // Sitting at the first stop 20 minutes after departure: every
        // remaining stop is late
        let sample = sample_at(10.0, 106.0, Utc.with_ymd_and_hms(2026, 3, 2, 8, 20, 0).unwrap());
        let report = estimator.build_report(&sample, &route, &schedule);

        assert!(!report.overall_on_time);
        assert!(report.stops.iter().any(|s| s.classification == Classification::Delayed));
    }
}
