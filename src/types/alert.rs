//! Alert types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of arrival alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Delay,
    Early,
    OnTime,
}

impl AlertType {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertType::Delay => "delay",
            AlertType::Early => "early",
            AlertType::OnTime => "on_time",
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

/// A single arrival alert for one stop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub stop_id: Uuid,
    pub estimated_arrival: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i64>,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Durable notification record for guardian/operator alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub route_id: Uuid,
    pub stop_id: Uuid,
    pub stop_name: String,
    pub event: AlertEvent,
    pub created_at: DateTime<Utc>,
}

impl AlertNotification {
    pub fn new(vehicle_id: Uuid, route_id: Uuid, stop_name: &str, event: AlertEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            route_id,
            stop_id: event.stop_id,
            stop_name: stop_name.to_string(),
            event,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_event_serializes_type_field() {
        let event = AlertEvent {
            alert_type: AlertType::Delay,
            stop_id: Uuid::nil(),
            estimated_arrival: Utc::now(),
            scheduled_time: None,
            delay_minutes: Some(12),
            severity: AlertSeverity::Medium,
            message: "Bus running 12 min late".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"delay\""));
        assert!(json.contains("\"severity\":\"medium\""));
        assert!(json.contains("\"delayMinutes\":12"));
    }

    #[test]
    fn test_alert_notification_copies_stop_id_from_event() {
        let stop_id = Uuid::new_v4();
        let event = AlertEvent {
            alert_type: AlertType::Early,
            stop_id,
            estimated_arrival: Utc::now(),
            scheduled_time: None,
            delay_minutes: Some(-7),
            severity: AlertSeverity::Low,
            message: "Bus running early".to_string(),
        };

        let notification = AlertNotification::new(Uuid::new_v4(), Uuid::new_v4(), "Oak Ave", event);
        assert_eq!(notification.stop_id, stop_id);
        assert_eq!(notification.stop_name, "Oak Ave");
    }
}
