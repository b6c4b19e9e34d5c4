//! NATS message handlers

pub mod directory;
pub mod ping;
pub mod tracking;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::services::alerts::AlertCooldownRegistry;
use crate::services::arrival::ArrivalEstimator;
use crate::services::directory::FleetDirectory;
use crate::services::live_feed::{FleetView, LiveUpdateChannel};
use crate::services::notifications::{
    InMemoryNotificationStore, JetStreamNotificationStore, NotificationStore,
};
use crate::services::path_cache::RoutePathCache;
use crate::services::routing::RouteGeometryResolver;
use crate::services::simulation::{ActiveFleet, SimulationClock};

/// Start the simulation clock, the fleet-view observer, and all message
/// handlers. Blocks until a handler loop dies.
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    // Shared engine components — injected, never ambient
    let fleet_directory = FleetDirectory::new();
    let fleet = ActiveFleet::new();
    let path_cache = RoutePathCache::new();
    let cooldowns = AlertCooldownRegistry::new();
    let estimator = ArrivalEstimator::new();

    let resolver = Arc::new(RouteGeometryResolver::from_config(config));

    let channel = LiveUpdateChannel::new(Some(client.clone()));

    // The worker's own dashboard projection: one observer among many
    let fleet_view = FleetView::new();
    let view_task = tokio::spawn(fleet_view.clone().run(channel.subscribe()));

    // Durable alert records; dropping to in-memory keeps alerts flowing when
    // JetStream is not available
    let notifications: Arc<dyn NotificationStore> =
        match JetStreamNotificationStore::new(client.clone()).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("JetStream unavailable, alert records stay in memory: {:#}", e);
                Arc::new(InMemoryNotificationStore::new())
            }
        };
    info!("Notification store initialized");

    // Single shared tick timer for the whole fleet
    let clock = SimulationClock::new(
        fleet.clone(),
        fleet_directory.clone(),
        estimator.clone(),
        channel.clone(),
        cooldowns,
        notifications,
        std::time::Duration::from_secs(config.tick_interval_secs),
    );
    let clock_shutdown = CancellationToken::new();
    let clock_task = tokio::spawn(clock.run(clock_shutdown.clone()));

    // Subscribe to all subjects
    let ping_sub = client.subscribe("buslink.ping").await?;

    let route_upsert_sub = client.subscribe("buslink.directory.route.upsert").await?;
    let route_remove_sub = client.subscribe("buslink.directory.route.remove").await?;
    let schedule_upsert_sub = client.subscribe("buslink.directory.schedule.upsert").await?;
    let schedule_remove_sub = client.subscribe("buslink.directory.schedule.remove").await?;
    let vehicle_upsert_sub = client.subscribe("buslink.directory.vehicle.upsert").await?;
    let vehicle_remove_sub = client.subscribe("buslink.directory.vehicle.remove").await?;

    let tracking_start_sub = client.subscribe("buslink.tracking.start").await?;
    let tracking_stop_sub = client.subscribe("buslink.tracking.stop").await?;
    let tracking_report_sub = client.subscribe("buslink.tracking.report").await?;
    let tracking_snapshot_sub = client.subscribe("buslink.tracking.snapshot").await?;

    info!("Subscribed to NATS subjects");

    // Clone for each handler
    let client_ping = client.clone();
    let client_route_upsert = client.clone();
    let client_route_remove = client.clone();
    let client_schedule_upsert = client.clone();
    let client_schedule_remove = client.clone();
    let client_vehicle_upsert = client.clone();
    let client_vehicle_remove = client.clone();
    let client_tracking_start = client.clone();
    let client_tracking_stop = client.clone();
    let client_tracking_report = client.clone();
    let client_tracking_snapshot = client.clone();

    let fleet_ping = fleet.clone();
    let fleet_schedule_remove = fleet.clone();
    let fleet_vehicle_upsert = fleet.clone();
    let fleet_vehicle_remove = fleet.clone();
    let fleet_tracking_start = fleet.clone();
    let fleet_tracking_stop = fleet.clone();
    let fleet_tracking_report = fleet;

    let directory_route_upsert = fleet_directory.clone();
    let directory_route_remove = fleet_directory.clone();
    let directory_schedule_upsert = fleet_directory.clone();
    let directory_schedule_remove = fleet_directory.clone();
    let directory_vehicle_upsert = fleet_directory.clone();
    let directory_vehicle_remove = fleet_directory.clone();
    let directory_tracking_start = fleet_directory.clone();
    let directory_tracking_report = fleet_directory;

    let view_schedule_remove = fleet_view.clone();
    let view_vehicle_upsert = fleet_view.clone();
    let view_vehicle_remove = fleet_view.clone();
    let view_tracking_stop = fleet_view.clone();
    let view_tracking_snapshot = fleet_view;

    let estimator_report = estimator;

    // Spawn handlers
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub, fleet_ping).await
    });

    let route_upsert_handle = tokio::spawn(async move {
        directory::handle_route_upsert(client_route_upsert, route_upsert_sub, directory_route_upsert).await
    });

    let route_remove_handle = tokio::spawn(async move {
        directory::handle_route_remove(client_route_remove, route_remove_sub, directory_route_remove).await
    });

    let schedule_upsert_handle = tokio::spawn(async move {
        directory::handle_schedule_upsert(client_schedule_upsert, schedule_upsert_sub, directory_schedule_upsert).await
    });

    let schedule_remove_handle = tokio::spawn(async move {
        directory::handle_schedule_remove(
            client_schedule_remove,
            schedule_remove_sub,
            directory_schedule_remove,
            fleet_schedule_remove,
            view_schedule_remove,
        ).await
    });

    let vehicle_upsert_handle = tokio::spawn(async move {
        directory::handle_vehicle_upsert(
            client_vehicle_upsert,
            vehicle_upsert_sub,
            directory_vehicle_upsert,
            fleet_vehicle_upsert,
            view_vehicle_upsert,
        ).await
    });

    let vehicle_remove_handle = tokio::spawn(async move {
        directory::handle_vehicle_remove(
            client_vehicle_remove,
            vehicle_remove_sub,
            directory_vehicle_remove,
            fleet_vehicle_remove,
            view_vehicle_remove,
        ).await
    });

    let tracking_start_handle = tokio::spawn(async move {
        tracking::handle_start(
            client_tracking_start,
            tracking_start_sub,
            directory_tracking_start,
            fleet_tracking_start,
            resolver,
            path_cache,
        ).await
    });

    let tracking_stop_handle = tokio::spawn(async move {
        tracking::handle_stop(client_tracking_stop, tracking_stop_sub, fleet_tracking_stop, view_tracking_stop).await
    });

    let tracking_report_handle = tokio::spawn(async move {
        tracking::handle_report(
            client_tracking_report,
            tracking_report_sub,
            directory_tracking_report,
            fleet_tracking_report,
            estimator_report,
        ).await
    });

    let tracking_snapshot_handle = tokio::spawn(async move {
        tracking::handle_snapshot(client_tracking_snapshot, tracking_snapshot_sub, view_tracking_snapshot).await
    });

    info!("All handlers started");

    // Wait for any handler to exit (they shouldn't)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = route_upsert_handle => {
            error!("Route upsert handler finished: {:?}", result);
        }
        result = route_remove_handle => {
            error!("Route remove handler finished: {:?}", result);
        }
        result = schedule_upsert_handle => {
            error!("Schedule upsert handler finished: {:?}", result);
        }
        result = schedule_remove_handle => {
            error!("Schedule remove handler finished: {:?}", result);
        }
        result = vehicle_upsert_handle => {
            error!("Vehicle upsert handler finished: {:?}", result);
        }
        result = vehicle_remove_handle => {
            error!("Vehicle remove handler finished: {:?}", result);
        }
        result = tracking_start_handle => {
            error!("Tracking start handler finished: {:?}", result);
        }
        result = tracking_stop_handle => {
            error!("Tracking stop handler finished: {:?}", result);
        }
        result = tracking_report_handle => {
            error!("Tracking report handler finished: {:?}", result);
        }
        result = tracking_snapshot_handle => {
            error!("Tracking snapshot handler finished: {:?}", result);
        }
        result = clock_task => {
            error!("Simulation clock finished: {:?}", result);
        }
        result = view_task => {
            error!("Fleet view observer finished: {:?}", result);
        }
    }

    clock_shutdown.cancel();

    Ok(())
}
