//! Schedule types

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operating-window schedule binding a vehicle to a route for one day.
///
/// There is no authored per-stop timetable; per-stop baselines are derived
/// from `start_time` plus a distance-proportional allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub vehicle_id: Uuid,
    pub operating_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Schedule {
    /// Departure instant of this schedule, in UTC
    pub fn departure(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.operating_date.and_time(self.start_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_departure_combines_date_and_start() {
        let schedule = Schedule {
            schedule_id: Uuid::nil(),
            route_id: Uuid::nil(),
            vehicle_id: Uuid::nil(),
            operating_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        };

        let departure = schedule.departure();
        assert_eq!(departure.to_rfc3339(), "2026-03-02T08:00:00+00:00");
    }

    #[test]
    fn test_schedule_deserialize_camel_case() {
        let json = r#"{
            "scheduleId": "123e4567-e89b-12d3-a456-426614174000",
            "routeId": "123e4567-e89b-12d3-a456-426614174001",
            "vehicleId": "123e4567-e89b-12d3-a456-426614174002",
            "operatingDate": "2026-03-02",
            "startTime": "07:45:00",
            "endTime": "09:00:00"
        }"#;

        let schedule: Schedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.start_time, NaiveTime::from_hms_opt(7, 45, 0).unwrap());
    }
}
