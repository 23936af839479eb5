//! Process configuration loaded from environment variables
//!
//! All tunables are read once at startup and passed explicitly to component
//! constructors; nothing in the core reads the environment after that.

use std::env;
use std::time::Duration;

/// Default NOAA Tides and Currents API base URL
const DEFAULT_NOAA_BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov";

/// Runtime configuration for the tide service components
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the upstream tide-data provider
    pub noaa_base_url: String,
    /// Per-attempt timeout for outbound HTTP requests
    pub http_timeout: Duration,
    /// Maximum retry attempts for idempotent GETs
    pub http_max_retries: u32,
    /// Maximum number of (station, day) records held in the prediction cache
    pub cache_lru_size: usize,
    /// How long a cached day record stays fresh
    pub cache_ttl: Duration,
    /// How long the station catalog stays fresh
    pub station_list_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            noaa_base_url: DEFAULT_NOAA_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(30),
            http_max_retries: 3,
            cache_lru_size: 1000,
            cache_ttl: Duration::from_secs(24 * 3600),
            station_list_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl Config {
    /// Builds a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `NOAA_BASE_URL`, `HTTP_TIMEOUT_SECONDS`,
    /// `HTTP_MAX_RETRIES`, `CACHE_LRU_SIZE`, `CACHE_TTL_HOURS`,
    /// `STATION_LIST_TTL_HOURS`.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            noaa_base_url: env::var("NOAA_BASE_URL").unwrap_or(defaults.noaa_base_url),
            http_timeout: env_parse("HTTP_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            http_max_retries: env_parse("HTTP_MAX_RETRIES").unwrap_or(defaults.http_max_retries),
            cache_lru_size: env_parse("CACHE_LRU_SIZE").unwrap_or(defaults.cache_lru_size),
            cache_ttl: env_parse("CACHE_TTL_HOURS")
                .map(|h: u64| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.cache_ttl),
            station_list_ttl: env_parse("STATION_LIST_TTL_HOURS")
                .map(|h: u64| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.station_list_ttl),
        }
    }
}

/// Reads and parses an environment variable, returning `None` if unset or invalid
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.noaa_base_url, DEFAULT_NOAA_BASE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.http_max_retries, 3);
        assert_eq!(config.cache_lru_size, 1000);
        assert_eq!(config.cache_ttl, Duration::from_secs(86400));
        assert_eq!(config.station_list_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        // Unset variables and unparseable values both fall back to None
        assert_eq!(env_parse::<u64>("TIDECAST_TEST_UNSET_VARIABLE"), None);
    }
}
