//! Tracking handlers — start/stop simulation, arrival reports, snapshots

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use chrono::Utc;
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::TrackingError;
use crate::services::arrival::ArrivalEstimator;
use crate::services::directory::FleetDirectory;
use crate::services::live_feed::FleetView;
use crate::services::path_cache::RoutePathCache;
use crate::services::routing::RouteGeometryResolver;
use crate::services::simulation::ActiveFleet;
use crate::types::{
    ArrivalReportRequest, EmptyPayload, ErrorResponse, FleetSnapshotResponse, Request,
    SuccessResponse, TrackingStartRequest, TrackingStartResponse, TrackingStopRequest,
    TrackingStopResponse,
};

/// Handle tracking.start messages.
///
/// Resolves the route geometry lazily: the first start for a route walks the
/// provider fallback chain, later starts reuse the cached path. Concurrent
/// first starts for the same route are not coalesced — both resolve and the
/// later insert wins with an equivalent path.
pub async fn handle_start(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
    fleet: ActiveFleet,
    resolver: Arc<RouteGeometryResolver>,
    path_cache: RoutePathCache,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tracking.start message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<TrackingStartRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let schedule = match directory.schedule(&request.payload.schedule_id) {
            Some(schedule) => schedule,
            None => {
                let error = ErrorResponse::new(request.id, "SCHEDULE_NOT_FOUND", "Unknown schedule");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let vehicle = match directory.vehicle(&schedule.vehicle_id) {
            Some(vehicle) => vehicle,
            None => {
                let error = ErrorResponse::new(request.id, "VEHICLE_NOT_FOUND", "Unknown vehicle");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        if !vehicle.in_service {
            let error = ErrorResponse::new(request.id, "VEHICLE_OUT_OF_SERVICE", "Vehicle is not in service");
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        let route = match directory.route(&schedule.route_id) {
            Some(route) => route,
            None => {
                let error = ErrorResponse::new(request.id, "ROUTE_NOT_FOUND", "Unknown route");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let waypoints = route.waypoints();
        if waypoints.is_empty() {
            let error = ErrorResponse::new(request.id, "ROUTE_NOT_GEOCODED", "Route has no geocoded stops");
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        let path = match path_cache.get(&route.route_id) {
            Some(path) => path,
            None => {
                let resolved = resolver.resolve(route.route_id, &waypoints).await;
                path_cache.insert(resolved)
            }
        };

        let response = TrackingStartResponse {
            vehicle_id: schedule.vehicle_id,
            route_id: schedule.route_id,
            schedule_id: schedule.schedule_id,
            path_points: path.len(),
            total_distance_km: path.total_distance_km,
        };

        fleet.start_tracking(
            schedule,
            vehicle.plate,
            path,
            request.payload.last_known_position,
            Utc::now(),
        );
        info!("Tracking started for vehicle {}", response.vehicle_id);

        let success = SuccessResponse::new(request.id, response);
        let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
    }

    Ok(())
}

/// Handle tracking.stop messages
pub async fn handle_stop(
    client: Client,
    mut subscriber: Subscriber,
    fleet: ActiveFleet,
    view: FleetView,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tracking.stop message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<TrackingStopRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let was_tracked = fleet.stop_tracking(&request.payload.vehicle_id);
        if was_tracked {
            view.remove(&request.payload.vehicle_id);
            info!("Tracking stopped for vehicle {}", request.payload.vehicle_id);
        }

        let response = SuccessResponse::new(request.id, TrackingStopResponse {
            vehicle_id: request.payload.vehicle_id,
            was_tracked,
        });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle tracking.report messages — full arrival report for one vehicle
pub async fn handle_report(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
    fleet: ActiveFleet,
    estimator: ArrivalEstimator,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tracking.report message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ArrivalReportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let vehicle_id = request.payload.vehicle_id;
        let context = fleet.with_tracked(&vehicle_id, |tracked| {
            (tracked.last_sample.clone(), tracked.schedule.clone())
        });

        let (sample, schedule) = match context {
            Some(context) => context,
            None => {
                let error = ErrorResponse::new(request.id, "NOT_TRACKED", "Vehicle is not tracked");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        // No sample yet means the first tick has not fired: report "no data"
        // rather than a guessed position
        let sample = match sample {
            Some(sample) => sample,
            None => {
                let err = TrackingError::StaleOrMissingPosition { vehicle_id };
                let error = ErrorResponse::new(request.id, err.code(), err.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let route = match directory.route(&schedule.route_id) {
            Some(route) => route,
            None => {
                let error = ErrorResponse::new(request.id, "ROUTE_NOT_FOUND", "Unknown route");
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let report = estimator.build_report(&sample, &route, &schedule);
        let response = SuccessResponse::new(request.id, report);
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle tracking.snapshot messages — reconciled view of all tracked
/// vehicles
pub async fn handle_snapshot(
    client: Client,
    mut subscriber: Subscriber,
    view: FleetView,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received tracking.snapshot message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<EmptyPayload> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let vehicles = view.snapshot();
        let total = vehicles.len();
        let response = SuccessResponse::new(request.id, FleetSnapshotResponse { vehicles, total });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
