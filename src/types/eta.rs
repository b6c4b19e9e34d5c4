//! Arrival estimates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AlertEvent, LiveSample};

/// Delay classification for a single stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    OnTime,
    Early,
    Delayed,
}

/// Arrival estimate for one remaining stop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEta {
    pub stop_id: Uuid,
    pub name: String,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    pub estimated_arrival: DateTime<Utc>,
    /// Distance from the live position to this stop along the stop sequence.
    /// Non-decreasing by stop order.
    pub cumulative_distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i64>,
    pub classification: Classification,
}

/// Full arrival report for one tracked vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalReport {
    pub vehicle_id: Uuid,
    pub route_id: Uuid,
    pub schedule_id: Uuid,
    pub current_sample: LiveSample,
    pub stops: Vec<StopEta>,
    /// True when no remaining stop is classified as delayed
    pub overall_on_time: bool,
    pub alerts: Vec<AlertEvent>,
}
