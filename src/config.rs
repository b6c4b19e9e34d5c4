//! Configuration management

use anyhow::Result;

use crate::defaults;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Primary directions provider base URL
    pub directions_url: String,

    /// Primary directions provider API key (optional — without it the
    /// resolver starts at the free fallback tier)
    pub directions_api_key: Option<String>,

    /// Secondary (OSRM-compatible) routing provider base URL
    pub osrm_url: String,

    /// Simulation tick interval in seconds
    pub tick_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let directions_url = std::env::var("DIRECTIONS_URL")
            .unwrap_or_else(|_| "https://maps.googleapis.com".to_string());

        let directions_api_key = std::env::var("DIRECTIONS_API_KEY").ok()
            .filter(|k| !k.is_empty());

        let osrm_url = std::env::var("OSRM_URL")
            .unwrap_or_else(|_| "https://router.project-osrm.org".to_string());

        let tick_interval_secs = match std::env::var("TICK_INTERVAL_SECS") {
            Ok(raw) => {
                let parsed: u64 = raw.parse().unwrap_or(defaults::TICK_INTERVAL_SECS);
                if parsed == 0 {
                    tracing::warn!("TICK_INTERVAL_SECS=0 is invalid, using default");
                    defaults::TICK_INTERVAL_SECS
                } else {
                    parsed
                }
            }
            Err(_) => defaults::TICK_INTERVAL_SECS,
        };

        if directions_api_key.is_none() {
            tracing::warn!("DIRECTIONS_API_KEY not set — primary directions provider disabled");
        }

        Ok(Self {
            nats_url,
            directions_url,
            directions_api_key,
            osrm_url,
            tick_interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_osrm_url_uses_local_when_set() {
        std::env::set_var("OSRM_URL", "http://localhost:5000");

        let config = Config::from_env().unwrap();
        assert_eq!(config.osrm_url, "http://localhost:5000");

        // Cleanup
        std::env::remove_var("OSRM_URL");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_directions_key_none_when_not_set() {
        std::env::remove_var("DIRECTIONS_API_KEY");

        let config = Config::from_env().unwrap();
        assert!(config.directions_api_key.is_none());
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_tick_interval_rejects_zero() {
        std::env::set_var("TICK_INTERVAL_SECS", "0");

        let config = Config::from_env().unwrap();
        assert_eq!(config.tick_interval_secs, defaults::TICK_INTERVAL_SECS);

        std::env::remove_var("TICK_INTERVAL_SECS");
    }
}
