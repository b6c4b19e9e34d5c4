//! Tracking engine services

pub mod alerts;
pub mod arrival;
pub mod directory;
pub mod geo;
pub mod live_feed;
pub mod notifications;
pub mod path_cache;
pub mod routing;
pub mod simulation;
