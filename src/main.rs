//! BusLink Tracking Worker - real-time fleet position simulation and
//! arrival estimation
//!
//! This worker connects to NATS, receives reference data from the platform,
//! and runs the simulation clock that feeds live dashboards and alerts.

mod cli;
mod config;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "tracking-worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,buslink_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())  // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    let args = cli::Cli::parse();

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    if let Some(cli::Command::CheckProviders { waypoint }) = args.command {
        return check_providers(&config, &waypoint).await;
    }

    info!("Starting BusLink Tracking Worker...");

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    // Start the clock and message handlers
    let handler_result = handlers::start_handlers(nats_client, &config).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Walk the directions chain once for a hand-given waypoint list and print
/// the outcome. Useful when bringing up provider credentials.
async fn check_providers(config: &config::Config, waypoints: &[(f64, f64)]) -> Result<()> {
    use services::routing::RouteGeometryResolver;
    use types::Coordinates;

    let waypoints: Vec<Coordinates> = waypoints
        .iter()
        .map(|(lat, lng)| Coordinates { lat: *lat, lng: *lng })
        .collect();

    let resolver = RouteGeometryResolver::from_config(config);
    let path = resolver.resolve(uuid::Uuid::new_v4(), &waypoints).await;

    info!(
        "Resolved {} waypoints into {} path points, {:.2} km total",
        waypoints.len(),
        path.len(),
        path.total_distance_km,
    );

    Ok(())
}
