//! Path simulation clock
//!
//! A single shared tick timer advances every active vehicle sequentially.
//! The advance step itself is a pure function over an explicit
//! {index, offset, direction} position value, so it can be unit-tested
//! without a clock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::defaults::{
    INITIAL_SPEED_KMH, MAX_SPEED_KMH, MIN_SPEED_KMH, SPEED_JITTER_KMH,
};
use crate::services::alerts::{self, AlertCooldownRegistry};
use crate::services::arrival::ArrivalEstimator;
use crate::services::directory::FleetDirectory;
use crate::services::geo::{haversine_distance, lerp, nearest_point_index, path_length_km};
use crate::services::live_feed::LiveUpdateChannel;
use crate::services::notifications::{self, NotificationStore};
use crate::types::{
    Coordinates, Direction, LiveFeedMessage, LiveSample, PathPosition, RoutePath, Schedule,
    SimulationState,
};

/// Segments shorter than this are stepped through without consuming distance
const ZERO_SEGMENT_KM: f64 = 1e-9;

// ==========================================================================
// Pure advance step
// ==========================================================================

/// Advance `position` along `points` by `distance_km`, oscillating at the
/// path ends. Walks one segment at a time, subtracting each segment's
/// haversine length until the remainder fits inside the current segment.
///
/// Degenerate paths (fewer than two points, or zero total length) leave the
/// position unchanged.
pub fn advance_position(points: &[Coordinates], position: PathPosition, distance_km: f64) -> PathPosition {
    if points.len() < 2 || distance_km <= 0.0 || path_length_km(points) <= ZERO_SEGMENT_KM {
        return position;
    }

    let last = points.len() - 1;
    let mut index = position.index.min(last);
    let mut offset = position.offset_km.max(0.0);
    let mut direction = position.direction;
    let mut remaining = distance_km;

    // A state seeded exactly on an endpoint facing outward turns around first
    if direction == Direction::Forward && index == last {
        direction = Direction::Backward;
    } else if direction == Direction::Backward && index == 0 {
        direction = Direction::Forward;
    }

    while remaining > 0.0 {
        let next = match direction {
            Direction::Forward => index + 1,
            Direction::Backward => index - 1,
        };

        let segment = haversine_distance(&points[index], &points[next]);
        if segment <= ZERO_SEGMENT_KM {
            index = next;
            offset = 0.0;
        } else {
            let available = segment - offset;
            if remaining < available {
                offset += remaining;
                break;
            }
            remaining -= available;
            index = next;
            offset = 0.0;
        }

        // Flip exactly on arrival at an endpoint
        if (direction == Direction::Forward && index == last)
            || (direction == Direction::Backward && index == 0)
        {
            direction = direction.flipped();
        }
    }

    PathPosition { index, offset_km: offset, direction }
}

/// Coordinates of a path position, interpolating the fractional offset
/// within the segment ahead
pub fn position_coordinates(points: &[Coordinates], position: &PathPosition) -> Coordinates {
    let last = points.len().saturating_sub(1);
    let index = position.index.min(last);

    if position.offset_km <= 0.0 {
        return points[index];
    }

    let next = match position.direction {
        Direction::Forward if index < last => index + 1,
        Direction::Backward if index > 0 => index - 1,
        _ => return points[index],
    };

    let segment = haversine_distance(&points[index], &points[next]);
    if segment <= ZERO_SEGMENT_KM {
        return points[index];
    }

    lerp(&points[index], &points[next], (position.offset_km / segment).clamp(0.0, 1.0))
}

/// Seed a position from a last known live fix: the nearest path point, or
/// the start of the path when no fix is known
pub fn seed_position(points: &[Coordinates], last_known: Option<Coordinates>) -> PathPosition {
    match last_known {
        Some(fix) if !points.is_empty() => PathPosition::at(nearest_point_index(points, &fix)),
        _ => PathPosition::start(),
    }
}

/// Per-tick bounded speed perturbation, clamped to the operating band
pub fn jittered_speed<R: Rng>(speed_kmh: f64, rng: &mut R) -> f64 {
    let jitter = rng.gen_range(-SPEED_JITTER_KMH..=SPEED_JITTER_KMH);
    (speed_kmh + jitter).clamp(MIN_SPEED_KMH, MAX_SPEED_KMH)
}

// ==========================================================================
// Active fleet registry
// ==========================================================================

/// Everything the clock needs for one tracked vehicle
pub struct TrackedVehicle {
    pub state: SimulationState,
    pub path: Arc<RoutePath>,
    pub schedule: Schedule,
    pub plate: Option<String>,
    pub last_sample: Option<LiveSample>,
    cancel: CancellationToken,
}

/// Registry of active simulation states, shared between the tick loop and
/// the NATS handlers. One entry per tracked vehicle.
#[derive(Clone, Default)]
pub struct ActiveFleet {
    vehicles: Arc<Mutex<HashMap<Uuid, TrackedVehicle>>>,
}

impl ActiveFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) tracking a vehicle. An existing entry for the same
    /// vehicle is cancelled and replaced.
    pub fn start_tracking(
        &self,
        schedule: Schedule,
        plate: Option<String>,
        path: Arc<RoutePath>,
        last_known: Option<Coordinates>,
        now: DateTime<Utc>,
    ) {
        let vehicle_id = schedule.vehicle_id;
        let position = seed_position(&path.points, last_known);

        let entry = TrackedVehicle {
            state: SimulationState {
                vehicle_id,
                route_id: schedule.route_id,
                position,
                speed_kmh: INITIAL_SPEED_KMH,
                last_tick: now,
            },
            path,
            schedule,
            plate,
            last_sample: None,
            cancel: CancellationToken::new(),
        };

        let mut vehicles = self.vehicles.lock();
        if let Some(previous) = vehicles.insert(vehicle_id, entry) {
            previous.cancel.cancel();
            debug!("Replaced existing tracking state for vehicle {}", vehicle_id);
        }
    }

    /// Stop tracking a vehicle. Pending tick work for it is dropped, never
    /// reinitialized. Returns false when the vehicle was not tracked.
    pub fn stop_tracking(&self, vehicle_id: &Uuid) -> bool {
        match self.vehicles.lock().remove(vehicle_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Stop every vehicle tracked under the given schedule
    pub fn stop_by_schedule(&self, schedule_id: &Uuid) -> Vec<Uuid> {
        let mut vehicles = self.vehicles.lock();
        let affected: Vec<Uuid> = vehicles
            .iter()
            .filter(|(_, v)| v.schedule.schedule_id == *schedule_id)
            .map(|(id, _)| *id)
            .collect();

        for id in &affected {
            if let Some(entry) = vehicles.remove(id) {
                entry.cancel.cancel();
            }
        }
        affected
    }

    pub fn is_tracked(&self, vehicle_id: &Uuid) -> bool {
        self.vehicles.lock().contains_key(vehicle_id)
    }

    pub fn vehicle_ids(&self) -> Vec<Uuid> {
        self.vehicles.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.vehicles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.lock().is_empty()
    }

    /// Read access to one tracked vehicle under the registry lock
    pub fn with_tracked<R>(&self, vehicle_id: &Uuid, f: impl FnOnce(&TrackedVehicle) -> R) -> Option<R> {
        self.vehicles.lock().get(vehicle_id).map(f)
    }
}

// ==========================================================================
// Simulation clock
// ==========================================================================

/// Drives all active vehicles off one shared tick timer. Tick latency grows
/// with fleet size; sharding is the scale-out path, not per-vehicle tasks.
pub struct SimulationClock {
    fleet: ActiveFleet,
    directory: FleetDirectory,
    estimator: ArrivalEstimator,
    channel: LiveUpdateChannel,
    cooldowns: AlertCooldownRegistry,
    notifications: Arc<dyn NotificationStore>,
    tick_interval: std::time::Duration,
}

impl SimulationClock {
    pub fn new(
        fleet: ActiveFleet,
        directory: FleetDirectory,
        estimator: ArrivalEstimator,
        channel: LiveUpdateChannel,
        cooldowns: AlertCooldownRegistry,
        notifications: Arc<dyn NotificationStore>,
        tick_interval: std::time::Duration,
    ) -> Self {
        Self {
            fleet,
            directory,
            estimator,
            channel,
            cooldowns,
            notifications,
            tick_interval,
        }
    }

    /// Run the tick loop until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Simulation clock started, tick every {:?}", self.tick_interval);
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now());
                }
                _ = shutdown.cancelled() => {
                    info!("Simulation clock stopped");
                    return;
                }
            }
        }
    }

    /// One tick across the whole fleet. A fault in one vehicle never aborts
    /// the others.
    pub fn tick(&self, now: DateTime<Utc>) {
        for vehicle_id in self.fleet.vehicle_ids() {
            if let Err(e) = self.tick_vehicle(&vehicle_id, now) {
                error!("Tick failed for vehicle {}: {:#}", vehicle_id, e);
            }
        }
    }

    fn tick_vehicle(&self, vehicle_id: &Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        let advanced = {
            let mut vehicles = self.fleet.vehicles.lock();
            let entry = match vehicles.get_mut(vehicle_id) {
                Some(entry) => entry,
                // Untracked between tick start and processing: drop the work
                None => return Ok(()),
            };
            if entry.cancel.is_cancelled() {
                return Ok(());
            }

            let elapsed_hours = (now - entry.state.last_tick)
                .num_milliseconds()
                .max(0) as f64
                / 3_600_000.0;
            let distance_km = entry.state.speed_kmh * elapsed_hours;

            entry.state.position = advance_position(&entry.path.points, entry.state.position, distance_km);
            entry.state.speed_kmh = jittered_speed(entry.state.speed_kmh, &mut rand::thread_rng());
            entry.state.last_tick = now;

            debug!(
                "Vehicle {} at index {} moving {}",
                vehicle_id,
                entry.state.position.index,
                entry.state.position.direction.as_str(),
            );

            let coords = position_coordinates(&entry.path.points, &entry.state.position);
            let sample = LiveSample {
                vehicle_id: *vehicle_id,
                lat: coords.lat,
                lng: coords.lng,
                speed_kmh: entry.state.speed_kmh,
                timestamp: now,
            };
            entry.last_sample = Some(sample.clone());

            (sample, entry.state.route_id, entry.schedule.clone(), entry.plate.clone())
        };
        let (sample, route_id, schedule, plate) = advanced;

        self.channel.publish_sample(LiveFeedMessage {
            vehicle_id: *vehicle_id,
            lat: Some(sample.lat),
            lng: Some(sample.lng),
            speed: Some(sample.speed_kmh),
            timestamp: Some(sample.timestamp),
            plate,
            route_id: Some(route_id),
        });

        let route = match self.directory.route(&route_id) {
            Some(route) => route,
            None => {
                warn!("Route {} missing from directory, skipping ETA for {}", route_id, vehicle_id);
                return Ok(());
            }
        };

        let report = self.estimator.build_report(&sample, &route, &schedule);
        let throttled = alerts::throttle(&self.cooldowns, &report.alerts);

        for event in throttled {
            let stop_name = route
                .stops
                .iter()
                .find(|s| s.stop_id == event.stop_id)
                .map(|s| s.name.clone())
                .unwrap_or_default();

            info!(
                "Alert {} ({}) for vehicle {} at {}",
                event.alert_type.as_str(),
                event.severity.as_str(),
                vehicle_id,
                stop_name,
            );
            self.channel.publish_alert(*vehicle_id, route_id, &stop_name, &event);
            notifications::persist_async(&self.notifications, *vehicle_id, route_id, &stop_name, event);
        }

        Ok(())
    }
}
