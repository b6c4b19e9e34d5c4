//! Live update channel and observer reconciliation
//!
//! One position message per vehicle per tick, plus alert messages, fan out
//! to any number of independent observers. In-process observers subscribe to
//! a broadcast channel; external dashboard bridges get the same payloads
//! mirrored onto per-room NATS subjects. Delivery is at-most-once telemetry,
//! not a durable event log — slow observers lag and drop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TrackingError;
use crate::types::{AlertEvent, AlertMessage, LiveFeedMessage, VehicleSnapshot};

/// Default broadcast buffer: a few ticks of a moderate fleet
const CHANNEL_CAPACITY: usize = 256;

/// One message on the live feed
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Position(LiveFeedMessage),
    Alert(AlertMessage),
}

/// Push channel for live telemetry. Publishing never blocks the tick loop:
/// in-process fan-out is synchronous-and-lossy, NATS mirroring is spawned
/// and failures are logged, not retried.
#[derive(Clone)]
pub struct LiveUpdateChannel {
    tx: broadcast::Sender<FeedEvent>,
    nats: Option<async_nats::Client>,
}

impl LiveUpdateChannel {
    pub fn new(nats: Option<async_nats::Client>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, nats }
    }

    /// Subscribe a new in-process observer
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    pub fn publish_sample(&self, message: LiveFeedMessage) {
        let route_id = message.route_id;
        // No receivers is fine — send only fails when nobody listens
        let _ = self.tx.send(FeedEvent::Position(message.clone()));
        self.mirror(route_id, &message);
    }

    pub fn publish_alert(&self, vehicle_id: Uuid, route_id: Uuid, stop_name: &str, event: &AlertEvent) {
        let message = AlertMessage {
            alert_type: event.alert_type,
            vehicle_id,
            stop_id: event.stop_id,
            stop_name: stop_name.to_string(),
            estimated_arrival: event.estimated_arrival,
            scheduled_time: event.scheduled_time,
            delay_minutes: event.delay_minutes.unwrap_or(0),
            message: event.message.clone(),
            severity: event.severity,
            timestamp: Utc::now(),
        };

        let _ = self.tx.send(FeedEvent::Alert(message.clone()));
        self.mirror(Some(route_id), &message);
    }

    /// Mirror a payload onto the room subjects, fire-and-forget
    fn mirror<T: serde::Serialize>(&self, route_id: Option<Uuid>, payload: &T) {
        let Some(client) = self.nats.clone() else {
            return;
        };

        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode live feed payload: {}", e);
                return;
            }
        };

        let subjects = room_subjects(route_id);
        tokio::spawn(async move {
            for subject in subjects {
                if let Err(e) = client.publish(subject.clone(), bytes.clone().into()).await {
                    let err = TrackingError::ChannelDelivery(e.to_string());
                    debug!("{} (subject {})", err, subject);
                }
            }
        });
    }
}

/// Logical rooms a payload belongs to: operators see everything, guardians
/// subscribe per route
fn room_subjects(route_id: Option<Uuid>) -> Vec<String> {
    let mut subjects = vec!["buslink.live.room.operators".to_string()];
    if let Some(route_id) = route_id {
        subjects.push(format!("buslink.live.room.route.{}", route_id));
    }
    subjects
}

// ==========================================================================
// Observer reconciliation
// ==========================================================================

/// Last-known-good view of one vehicle, reconciled from partial messages.
///
/// The reducer is last-received-wins: a present field always overwrites, an
/// absent field never clobbers what an earlier message established. There is
/// no timestamp ordering — a stale overwrite self-heals on the next tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleProjection {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub speed: Option<f64>,
    pub plate: Option<String>,
    pub route_id: Option<Uuid>,
    pub last_seen: Option<chrono::DateTime<Utc>>,
}

impl VehicleProjection {
    /// Merge one message into this projection, returning the updated
    /// snapshot. Never mutates in place.
    pub fn apply(&self, message: &LiveFeedMessage) -> Self {
        Self {
            lat: message.lat.or(self.lat),
            lng: message.lng.or(self.lng),
            speed: message.speed.or(self.speed),
            plate: message.plate.clone().or_else(|| self.plate.clone()),
            route_id: message.route_id.or(self.route_id),
            last_seen: message.timestamp.or(self.last_seen),
        }
    }

    pub fn snapshot(&self, vehicle_id: Uuid) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_id,
            lat: self.lat,
            lng: self.lng,
            speed: self.speed,
            plate: self.plate.clone(),
            route_id: self.route_id,
            last_seen: self.last_seen,
        }
    }
}

/// An observer's local projection of the whole fleet, keyed by vehicle
#[derive(Clone, Default)]
pub struct FleetView {
    vehicles: Arc<RwLock<HashMap<Uuid, VehicleProjection>>>,
}

impl FleetView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, message: &LiveFeedMessage) {
        let mut vehicles = self.vehicles.write();
        let current = vehicles.entry(message.vehicle_id).or_default();
        *current = current.apply(message);
    }

    pub fn remove(&self, vehicle_id: &Uuid) {
        self.vehicles.write().remove(vehicle_id);
    }

    pub fn get(&self, vehicle_id: &Uuid) -> Option<VehicleProjection> {
        self.vehicles.read().get(vehicle_id).cloned()
    }

    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        let mut all: Vec<VehicleSnapshot> = self
            .vehicles
            .read()
            .iter()
            .map(|(id, projection)| projection.snapshot(*id))
            .collect();
        all.sort_by_key(|s| s.vehicle_id);
        all
    }

    pub fn len(&self) -> usize {
        self.vehicles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.read().is_empty()
    }

    /// Consume the live feed into this view until the channel closes.
    /// Lagging just drops the missed messages — the next tick heals the
    /// projection.
    pub async fn run(self, mut rx: broadcast::Receiver<FeedEvent>) {
        loop {
            match rx.recv().await {
                Ok(FeedEvent::Position(message)) => self.apply(&message),
                Ok(FeedEvent::Alert(_)) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!("Fleet view lagged, dropped {} feed messages", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}
