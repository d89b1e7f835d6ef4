//! # Configuration System
//!
//! Environment-aware configuration for the similar-products service.
//!
//! ## Architecture
//!
//! - **Layered sources**: `config/base.yaml`, then `config/{environment}.yaml`,
//!   then `SIMILAR_PRODUCTS__SECTION__KEY` environment variables
//! - **Complete defaults**: every field has a default, so an empty source set
//!   still yields a working configuration
//! - **Explicit validation**: invalid values fail loading instead of being
//!   silently corrected
//!
//! ## Usage
//!
//! ```rust,no_run
//! use similar_products::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let base_url = &manager.config().upstream.base_url;
//! let breaker = manager.config().circuit_breaker.to_resilience_config();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::DetailStoreConfig;
use crate::resilience::CircuitBreakerConfig;
use crate::services::SimilarProductsServiceConfig;
use crate::upstream::HttpCatalogConfig;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/base.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub circuit_breaker: CircuitBreakerSettings,
    pub service: ServiceConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Upstream catalog connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout_ms: 3000,
            request_timeout_ms: 8000,
            pool_max_idle_per_host: 200,
            pool_idle_timeout_ms: 30_000,
        }
    }
}

impl UpstreamConfig {
    pub fn to_catalog_config(&self) -> HttpCatalogConfig {
        HttpCatalogConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_millis(self.pool_idle_timeout_ms),
        }
    }
}

/// Detail store sizing and expiry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub maximum_size: u64,
    pub expire_after_write_ms: u64,
    pub expire_after_access_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maximum_size: 1000,
            expire_after_write_ms: 1_800_000,
            expire_after_access_ms: 600_000,
        }
    }
}

impl CacheConfig {
    pub fn to_store_config(&self) -> DetailStoreConfig {
        DetailStoreConfig {
            maximum_size: self.maximum_size,
            expire_after_write: Duration::from_millis(self.expire_after_write_ms),
            expire_after_access: Duration::from_millis(self.expire_after_access_ms),
        }
    }
}

/// Circuit breaker settings for the upstream catalog
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub name: String,
    pub failure_rate_threshold: f64,
    pub wait_duration_in_open_state_ms: u64,
    pub sliding_window_size: u32,
    pub minimum_number_of_calls: u32,
    pub slow_call_rate_threshold: f64,
    pub slow_call_duration_threshold_ms: u64,
    pub permitted_calls_in_half_open_state: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            name: "productDetailCB".to_string(),
            failure_rate_threshold: 50.0,
            wait_duration_in_open_state_ms: 10_000,
            sliding_window_size: 100,
            minimum_number_of_calls: 20,
            slow_call_rate_threshold: 50.0,
            slow_call_duration_threshold_ms: 5000,
            permitted_calls_in_half_open_state: 10,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_resilience_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_rate_threshold: self.failure_rate_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            slow_call_duration_threshold: Duration::from_millis(
                self.slow_call_duration_threshold_ms,
            ),
            sliding_window_size: self.sliding_window_size,
            minimum_number_of_calls: self.minimum_number_of_calls,
            wait_duration_in_open_state: Duration::from_millis(self.wait_duration_in_open_state_ms),
            permitted_calls_in_half_open_state: self.permitted_calls_in_half_open_state,
        }
    }
}

/// Aggregation fan-out settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Fan-out deadline; `None` disables it
    pub similar_products_timeout_ms: Option<u64>,
    pub concurrency_level: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            similar_products_timeout_ms: Some(5000),
            concurrency_level: 10,
        }
    }
}

impl ServiceConfig {
    pub fn to_service_config(&self) -> SimilarProductsServiceConfig {
        SimilarProductsServiceConfig {
            similar_products_timeout: self.similar_products_timeout_ms.map(Duration::from_millis),
            concurrency_level: self.concurrency_level,
        }
    }
}

impl AppConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "server.bind_address",
                "server configuration",
            ));
        }

        if self.upstream.base_url.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "upstream.base_url",
                "upstream configuration",
            ));
        }

        if self.upstream.request_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "upstream.request_timeout_ms",
                "0",
                "request timeout must be greater than 0",
            ));
        }

        if self.cache.maximum_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "cache.maximum_size",
                "0",
                "cache size must be greater than 0",
            ));
        }

        if self.service.concurrency_level == 0 {
            return Err(ConfigurationError::invalid_value(
                "service.concurrency_level",
                "0",
                "concurrency level must be greater than 0",
            ));
        }

        if self.service.similar_products_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "service.similar_products_timeout_ms",
                "0",
                "omit the timeout to disable it",
            ));
        }

        if self.circuit_breaker.name.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "circuit_breaker.name",
                "circuit breaker configuration",
            ));
        }

        self.circuit_breaker
            .to_resilience_config()
            .validate()
            .map_err(|reason| {
                ConfigurationError::invalid_value("circuit_breaker", "<section>", reason)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_address, "0.0.0.0:5000");
        assert_eq!(config.circuit_breaker.name, "productDetailCB");
    }

    #[test]
    fn test_section_conversions() {
        let config = AppConfig::default();

        let breaker = config.circuit_breaker.to_resilience_config();
        assert_eq!(breaker.sliding_window_size, 100);
        assert_eq!(breaker.minimum_number_of_calls, 20);
        assert_eq!(breaker.wait_duration_in_open_state, Duration::from_secs(10));
        assert_eq!(breaker.permitted_calls_in_half_open_state, 10);

        let store = config.cache.to_store_config();
        assert_eq!(store.maximum_size, 1000);
        assert_eq!(store.expire_after_write, Duration::from_secs(30 * 60));
        assert_eq!(store.expire_after_access, Duration::from_secs(10 * 60));

        let service = config.service.to_service_config();
        assert_eq!(service.similar_products_timeout, Some(Duration::from_secs(5)));

        let catalog = config.upstream.to_catalog_config();
        assert_eq!(catalog.connect_timeout, Duration::from_secs(3));
        assert_eq!(catalog.request_timeout, Duration::from_secs(8));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.service.concurrency_level = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let mut config = AppConfig::default();
        config.upstream.base_url.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));

        let mut config = AppConfig::default();
        config.circuit_breaker.failure_rate_threshold = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "upstream": { "base_url": "http://catalog:3001" },
            "service": { "similar_products_timeout_ms": null }
        }))
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://catalog:3001");
        assert_eq!(config.upstream.request_timeout_ms, 8000);
        assert_eq!(config.service.similar_products_timeout_ms, None);
        assert_eq!(config.service.concurrency_level, 10);
    }
}
