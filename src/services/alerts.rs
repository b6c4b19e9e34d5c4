//! Delay classification alerts and throttling
//!
//! Builds alert candidates from classified stop ETAs and gates them through
//! a per-(stop, kind) cooldown so observers are not re-notified every tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::defaults::{
    ALERT_COOLDOWN_SECS, ALERT_REGISTRY_MAX_ENTRIES, SEVERITY_HIGH_MINUTES,
    SEVERITY_MEDIUM_MINUTES,
};
use crate::types::{AlertEvent, AlertSeverity, AlertType, Classification, StopEta};

/// Severity for a delay of the given magnitude. Early arrivals are always
/// informational and never go through this ladder.
pub fn severity_for_delay(delay_minutes: i64) -> AlertSeverity {
    if delay_minutes > SEVERITY_HIGH_MINUTES {
        AlertSeverity::High
    } else if delay_minutes > SEVERITY_MEDIUM_MINUTES {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    }
}

/// Unthrottled alert candidates for a set of remaining-stop ETAs.
///
/// Delayed and early stops always produce a candidate; an informational
/// on-time arrival notice is produced only for the next upcoming stop.
pub fn candidates(stops: &[StopEta]) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    for (i, stop) in stops.iter().enumerate() {
        let delay = stop.delay_minutes.unwrap_or(0);

        let event = match stop.classification {
            Classification::Delayed => AlertEvent {
                alert_type: AlertType::Delay,
                stop_id: stop.stop_id,
                estimated_arrival: stop.estimated_arrival,
                scheduled_time: stop.scheduled_time,
                delay_minutes: stop.delay_minutes,
                severity: severity_for_delay(delay),
                message: format!("Bus is running {} min late for {}", delay, stop.name),
            },
            Classification::Early => AlertEvent {
                alert_type: AlertType::Early,
                stop_id: stop.stop_id,
                estimated_arrival: stop.estimated_arrival,
                scheduled_time: stop.scheduled_time,
                delay_minutes: stop.delay_minutes,
                severity: AlertSeverity::Low,
                message: format!("Bus is running {} min early for {}", delay.abs(), stop.name),
            },
            Classification::OnTime => {
                if i != 0 {
                    continue;
                }
                // Arrival notice for the next stop only
                AlertEvent {
                    alert_type: AlertType::OnTime,
                    stop_id: stop.stop_id,
                    estimated_arrival: stop.estimated_arrival,
                    scheduled_time: stop.scheduled_time,
                    delay_minutes: stop.delay_minutes,
                    severity: AlertSeverity::Low,
                    message: format!(
                        "Bus is on time, arriving at {} around {}",
                        stop.name,
                        stop.estimated_arrival.format("%H:%M"),
                    ),
                }
            }
        };

        events.push(event);
    }

    events
}

/// Drop candidates whose (stop, kind) pair alerted within the cooldown
pub fn throttle(registry: &AlertCooldownRegistry, events: &[AlertEvent]) -> Vec<AlertEvent> {
    events
        .iter()
        .filter(|e| registry.check_and_record(e.stop_id, e.alert_type))
        .cloned()
        .collect()
}

// =============================================================================
// AlertCooldownRegistry
// =============================================================================

/// In-memory cooldown tracker — last-sent instant per (stop, kind).
///
/// Process-wide but injected, so tests can use isolated instances. Memory is
/// bounded by bulk-clearing the whole map once it grows past the entry bound
/// (no per-key eviction).
#[derive(Clone)]
pub struct AlertCooldownRegistry {
    sent: Arc<Mutex<HashMap<(Uuid, AlertType), Instant>>>,
    cooldown: Duration,
    max_entries: usize,
}

impl Default for AlertCooldownRegistry {
    fn default() -> Self {
        Self::with_params(Duration::from_secs(ALERT_COOLDOWN_SECS), ALERT_REGISTRY_MAX_ENTRIES)
    }
}

impl AlertCooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(cooldown: Duration, max_entries: usize) -> Self {
        Self {
            sent: Arc::new(Mutex::new(HashMap::new())),
            cooldown,
            max_entries,
        }
    }

    /// Check a (stop, kind) pair against the cooldown. Returns `true` if an
    /// alert may be sent now, and records the send time on `true`.
    pub fn check_and_record(&self, stop_id: Uuid, alert_type: AlertType) -> bool {
        let mut sent = self.sent.lock();
        let now = Instant::now();

        if let Some(last) = sent.get(&(stop_id, alert_type)) {
            if now.duration_since(*last) < self.cooldown {
                return false;
            }
        }

        if sent.len() >= self.max_entries {
            debug!("Alert cooldown registry at {} entries, bulk clearing", sent.len());
            sent.clear();
        }

        sent.insert((stop_id, alert_type), now);
        true
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
