//! # System Bootstrap
//!
//! Wires one process worth of components from configuration:
//!
//! ```text
//! HttpProductCatalog ─┐
//!                     ├─> UpstreamClient ─┐
//! CircuitBreaker ─────┘                   ├─> SimilarProductsService ─> web::AppState
//! DetailStore ────────────────────────────┘
//! ```
//!
//! The breaker and the store are created once here and shared by every
//! request.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::cache::DetailStore;
use crate::config::{AppConfig, ConfigurationError};
use crate::resilience::CircuitBreaker;
use crate::services::SimilarProductsService;
use crate::upstream::{HttpProductCatalog, ProductCatalog, UpstreamClient, UpstreamError};
use crate::web::{self, AppState};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to create upstream catalog client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Handle to the wired components of a running service
#[derive(Debug, Clone)]
pub struct SimilarProductsSystem {
    pub circuit_breaker: Arc<CircuitBreaker>,
    pub detail_store: DetailStore,
    pub client: Arc<UpstreamClient>,
    pub service: Arc<SimilarProductsService>,
}

impl SimilarProductsSystem {
    /// Build the system against the HTTP catalog named in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let catalog = HttpProductCatalog::new(config.upstream.to_catalog_config())?;
        Ok(Self::with_catalog(config, Arc::new(catalog)))
    }

    /// Build the system against any catalog implementation
    pub fn with_catalog(config: &AppConfig, catalog: Arc<dyn ProductCatalog>) -> Self {
        let circuit_breaker = Arc::new(CircuitBreaker::new(
            config.circuit_breaker.name.clone(),
            config.circuit_breaker.to_resilience_config(),
        ));
        let detail_store = DetailStore::new(config.cache.to_store_config());
        let client = Arc::new(UpstreamClient::new(catalog, Arc::clone(&circuit_breaker)));
        let service = Arc::new(SimilarProductsService::new(
            Arc::clone(&client),
            detail_store.clone(),
            config.service.to_service_config(),
        ));

        info!(
            circuit_breaker = %circuit_breaker.name(),
            cache_size = config.cache.maximum_size,
            concurrency_level = config.service.concurrency_level,
            "Similar products system bootstrapped"
        );

        Self {
            circuit_breaker,
            detail_store,
            client,
            service,
        }
    }

    pub fn app_state(&self, environment: impl Into<String>) -> AppState {
        AppState::new(Arc::clone(&self.service), environment)
    }

    pub fn router(&self, environment: impl Into<String>) -> axum::Router {
        web::create_router(self.app_state(environment))
    }
}
