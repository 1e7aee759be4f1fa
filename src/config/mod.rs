//! Configuration management for flowkit
//!
//! Layout spacing, catalog cache limits and the trigger catalog endpoint.
//! Every value can be overridden through a `FLOWKIT_*` environment variable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Auto-layout spacing
    pub layout: LayoutConfig,
    /// Trigger catalog cache limits
    pub cache: CacheConfig,
    /// Trigger catalog HTTP endpoint
    pub catalog: CatalogConfig,
}

/// Spacing used by the layout engine (pixels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    /// Left edge of every tree and of the orphan row
    pub start_x: f64,
    /// Top edge of the first tree
    pub start_y: f64,
}

/// Resource cache limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Minimum time between two fetch starts for the same key
    #[serde(with = "millis")]
    pub min_interval: Duration,
    /// Total `get` calls after which a possible caller loop is reported
    pub warn_after_calls: u64,
    /// Total `get` calls after which the loader is never invoked again
    pub max_calls: u64,
    /// Key aliases, alias -> canonical key
    pub aliases: HashMap<String, String>,
}

/// Trigger catalog HTTP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the service exposing `/api/triggers/{channel}`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: env_or("FLOWKIT_NODE_WIDTH", 240.0),
            node_height: env_or("FLOWKIT_NODE_HEIGHT", 120.0),
            horizontal_gap: env_or("FLOWKIT_HORIZONTAL_GAP", 60.0),
            vertical_gap: env_or("FLOWKIT_VERTICAL_GAP", 40.0),
            start_x: env_or("FLOWKIT_START_X", 50.0),
            start_y: env_or("FLOWKIT_START_Y", 50.0),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let aliases = [
            ("ig", "instagram"),
            ("facebook", "messenger"),
            ("fb", "messenger"),
            ("wa", "whatsapp"),
        ]
        .into_iter()
        .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
        .collect();

        Self {
            min_interval: Duration::from_millis(env_or("FLOWKIT_CACHE_MIN_INTERVAL_MS", 1000)),
            warn_after_calls: env_or("FLOWKIT_CACHE_WARN_CALLS", 50),
            max_calls: env_or("FLOWKIT_CACHE_MAX_CALLS", 500),
            aliases,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("FLOWKIT_CATALOG_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            timeout_secs: env_or("FLOWKIT_CATALOG_TIMEOUT_SECS", 10),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Read an environment variable, falling back on absence or parse failure
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_spacing() {
        let layout = LayoutConfig::default();
        assert!(layout.node_width > 0.0);
        assert!(layout.vertical_gap > 0.0);
    }

    #[test]
    fn test_cache_config_serializes_interval_as_millis() {
        let config = CacheConfig {
            min_interval: Duration::from_millis(1500),
            warn_after_calls: 5,
            max_calls: 10,
            aliases: HashMap::new(),
        };

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["min_interval"], 1500);

        let back: CacheConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back.min_interval, Duration::from_millis(1500));
    }

    #[test]
    fn test_default_aliases_point_at_canonical_channels() {
        let config = CacheConfig::default();
        assert_eq!(config.aliases.get("ig").map(String::as_str), Some("instagram"));
        assert_eq!(config.aliases.get("fb").map(String::as_str), Some("messenger"));
    }
}
