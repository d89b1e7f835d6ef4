//! # Web API Application State
//!
//! Shared state handed to every handler: the aggregation service plus the
//! process-wide breaker and store it runs on, for health reporting.

use std::sync::Arc;

use crate::cache::DetailStore;
use crate::resilience::CircuitBreaker;
use crate::services::SimilarProductsService;

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<SimilarProductsService>,
    pub circuit_breaker: Arc<CircuitBreaker>,
    pub detail_store: DetailStore,
    pub environment: String,
}

impl AppState {
    pub fn new(service: Arc<SimilarProductsService>, environment: impl Into<String>) -> Self {
        let circuit_breaker = Arc::clone(service.client().circuit_breaker());
        let detail_store = service.store().clone();
        Self {
            service,
            circuit_breaker,
            detail_store,
            environment: environment.into(),
        }
    }
}
