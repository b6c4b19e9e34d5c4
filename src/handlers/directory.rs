//! Directory handlers — reference data pushed in by the CRUD application

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::services::directory::FleetDirectory;
use crate::services::live_feed::FleetView;
use crate::services::simulation::ActiveFleet;
use crate::types::{
    AckResponse, ErrorResponse, RemoveRequest, RemoveResponse, Request, RouteRecord,
    Schedule, SuccessResponse, VehicleRecord,
};

/// Handle directory.route.upsert messages
pub async fn handle_route_upsert(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.route.upsert message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RouteRecord> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let route_id = request.payload.route_id;
        directory.upsert_route(request.payload);
        info!("Route {} upserted", route_id);

        let response = SuccessResponse::new(request.id, AckResponse { id: route_id });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle directory.route.remove messages
pub async fn handle_route_remove(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.route.remove message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RemoveRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let removed = directory.remove_route(&request.payload.id);
        let response = SuccessResponse::new(request.id, RemoveResponse {
            id: request.payload.id,
            removed,
        });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle directory.schedule.upsert messages
pub async fn handle_schedule_upsert(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.schedule.upsert message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<Schedule> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let schedule_id = request.payload.schedule_id;
        directory.upsert_schedule(request.payload);

        let response = SuccessResponse::new(request.id, AckResponse { id: schedule_id });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle directory.schedule.remove messages. A cancelled schedule also ends
/// tracking for every vehicle running under it.
pub async fn handle_schedule_remove(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
    fleet: ActiveFleet,
    view: FleetView,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.schedule.remove message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RemoveRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let removed = directory.remove_schedule(&request.payload.id);
        let stopped = fleet.stop_by_schedule(&request.payload.id);
        for vehicle_id in &stopped {
            view.remove(vehicle_id);
        }
        if !stopped.is_empty() {
            info!("Schedule {} removed, tracking stopped for {} vehicle(s)", request.payload.id, stopped.len());
        }

        let response = SuccessResponse::new(request.id, RemoveResponse {
            id: request.payload.id,
            removed,
        });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle directory.vehicle.upsert messages. Marking a vehicle out of
/// service ends its tracking.
pub async fn handle_vehicle_upsert(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
    fleet: ActiveFleet,
    view: FleetView,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.vehicle.upsert message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<VehicleRecord> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let vehicle_id = request.payload.vehicle_id;
        let in_service = request.payload.in_service;
        directory.upsert_vehicle(request.payload);

        if !in_service && fleet.stop_tracking(&vehicle_id) {
            view.remove(&vehicle_id);
            info!("Vehicle {} left service, tracking stopped", vehicle_id);
        }

        let response = SuccessResponse::new(request.id, AckResponse { id: vehicle_id });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}

/// Handle directory.vehicle.remove messages
pub async fn handle_vehicle_remove(
    client: Client,
    mut subscriber: Subscriber,
    directory: FleetDirectory,
    fleet: ActiveFleet,
    view: FleetView,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received directory.vehicle.remove message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RemoveRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let removed = directory.remove_vehicle(&request.payload.id);
        if fleet.stop_tracking(&request.payload.id) {
            view.remove(&request.payload.id);
            info!("Vehicle {} removed, tracking stopped", request.payload.id);
        }

        let response = SuccessResponse::new(request.id, RemoveResponse {
            id: request.payload.id,
            removed,
        });
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
