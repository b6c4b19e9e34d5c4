//! Operational constants for the tracking engine

/// Simulation tick interval in seconds
pub const TICK_INTERVAL_SECS: u64 = 5;

/// Starting speed for a newly tracked vehicle, km/h
pub const INITIAL_SPEED_KMH: f64 = 40.0;

/// Per-tick bounded random speed perturbation, km/h
pub const SPEED_JITTER_KMH: f64 = 2.5;

/// Simulated speed clamp bounds, km/h
pub const MIN_SPEED_KMH: f64 = 20.0;
pub const MAX_SPEED_KMH: f64 = 60.0;

/// Expected average travel speed used for ETA math, km/h. Distinct from the
/// instantaneous simulated speed — it accounts for stops and slowdowns.
pub const ASSUMED_AVERAGE_SPEED_KMH: f64 = 35.0;

/// Delay classification threshold, minutes (either side of schedule)
pub const ON_TIME_TOLERANCE_MINUTES: i64 = 5;

/// Severity ladder thresholds, minutes of delay
pub const SEVERITY_MEDIUM_MINUTES: i64 = 10;
pub const SEVERITY_HIGH_MINUTES: i64 = 15;

/// Minimum interval between two same-kind alerts for the same stop
pub const ALERT_COOLDOWN_SECS: u64 = 300;

/// Cooldown registry size bound; the registry is bulk-cleared past this
pub const ALERT_REGISTRY_MAX_ENTRIES: usize = 100;

/// Interpolation fallback: at least one path point per this many km
pub const INTERPOLATION_SPACING_KM: f64 = 0.1;

/// Directions provider request timeout in seconds
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;
