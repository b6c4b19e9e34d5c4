//! Fleet reference-data directory
//!
//! In-memory read model of routes, schedules, and vehicles, populated by
//! the platform's CRUD application over NATS. The tracking engine only
//! reads; it never mutates the platform's records.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::types::{RouteRecord, Schedule, VehicleRecord};

/// Shared directory of reference data keyed by id
#[derive(Clone, Default)]
pub struct FleetDirectory {
    routes: Arc<RwLock<HashMap<Uuid, RouteRecord>>>,
    schedules: Arc<RwLock<HashMap<Uuid, Schedule>>>,
    vehicles: Arc<RwLock<HashMap<Uuid, VehicleRecord>>>,
}

impl FleetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // Routes

    pub fn upsert_route(&self, mut route: RouteRecord) {
        route.stops.sort_by_key(|s| s.order);
        self.routes.write().insert(route.route_id, route);
    }

    pub fn remove_route(&self, route_id: &Uuid) -> bool {
        self.routes.write().remove(route_id).is_some()
    }

    pub fn route(&self, route_id: &Uuid) -> Option<RouteRecord> {
        self.routes.read().get(route_id).cloned()
    }

    // Schedules

    pub fn upsert_schedule(&self, schedule: Schedule) {
        self.schedules.write().insert(schedule.schedule_id, schedule);
    }

    pub fn remove_schedule(&self, schedule_id: &Uuid) -> bool {
        self.schedules.write().remove(schedule_id).is_some()
    }

    pub fn schedule(&self, schedule_id: &Uuid) -> Option<Schedule> {
        self.schedules.read().get(schedule_id).cloned()
    }

    // Vehicles

    pub fn upsert_vehicle(&self, vehicle: VehicleRecord) {
        self.vehicles.write().insert(vehicle.vehicle_id, vehicle);
    }

    pub fn remove_vehicle(&self, vehicle_id: &Uuid) -> bool {
        self.vehicles.write().remove(vehicle_id).is_some()
    }

    pub fn vehicle(&self, vehicle_id: &Uuid) -> Option<VehicleRecord> {
        self.vehicles.read().get(vehicle_id).cloned()
    }

    /// In-service check used before tracking starts
    pub fn vehicle_in_service(&self, vehicle_id: &Uuid) -> bool {
        self.vehicles
            .read()
            .get(vehicle_id)
            .map(|v| v.in_service)
            .unwrap_or(false)
    }
}
