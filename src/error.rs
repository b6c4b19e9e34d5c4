//! Error taxonomy for the tracking engine

use thiserror::Error;

/// Failures the engine can encounter. Provider-specific failures never leave
/// the geometry resolver; the rest surface as NATS error codes or log lines.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Network/HTTP failure from a directions provider. Recovered by falling
    /// through the provider chain.
    #[error("directions provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Fewer than two usable waypoints. Recovered by returning the input
    /// unchanged.
    #[error("route has fewer than 2 usable waypoints ({count})")]
    DegenerateRoute { count: usize },

    /// No live sample for a tracked vehicle. Surfaced as "no data", never a
    /// guessed report.
    #[error("no live position for vehicle {vehicle_id}")]
    StaleOrMissingPosition { vehicle_id: uuid::Uuid },

    /// Push/persist failure on the live channel or notification store.
    /// Logged and dropped, non-fatal.
    #[error("live channel delivery failed: {0}")]
    ChannelDelivery(String),

    /// Missing provider credentials or similar. Falls through to the
    /// no-credential fallback tier.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TrackingError {
    pub fn provider(provider: &str, reason: impl std::fmt::Display) -> Self {
        Self::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// NATS error code for request/reply surfaces
    pub fn code(&self) -> &'static str {
        match self {
            TrackingError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            TrackingError::DegenerateRoute { .. } => "DEGENERATE_ROUTE",
            TrackingError::StaleOrMissingPosition { .. } => "NO_POSITION",
            TrackingError::ChannelDelivery(_) => "DELIVERY_FAILED",
            TrackingError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}
