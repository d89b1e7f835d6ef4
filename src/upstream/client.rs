//! # Upstream Client
//!
//! Routes both catalog operations through the shared circuit breaker and
//! applies the degradation policy for each of them.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ProductDetail, ProductId, SimilarIdList};
use crate::resilience::{CircuitBreaker, CircuitBreakerError};
use crate::upstream::catalog::ProductCatalog;
use crate::upstream::errors::{UpstreamError, UpstreamResult};

/// Circuit-protected access to the product catalog
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    catalog: Arc<dyn ProductCatalog>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl UpstreamClient {
    pub fn new(catalog: Arc<dyn ProductCatalog>, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            catalog,
            circuit_breaker,
        }
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Similar ids for `id`, in upstream order
    ///
    /// Unavailability (404, transport failure, 5xx, open circuit) yields an
    /// empty list. Only unrecoverable failures are returned as errors.
    pub async fn list_similar_ids(&self, id: &ProductId) -> UpstreamResult<SimilarIdList> {
        let catalog = Arc::clone(&self.catalog);
        let result = self
            .circuit_breaker
            .call(|| async move { catalog.fetch_similar_ids(id).await })
            .await;

        match result.map_err(Self::flatten) {
            Ok(Some(ids)) => {
                debug!(product_id = %id, count = ids.len(), "Resolved similar ids");
                Ok(ids)
            }
            Ok(None) => {
                debug!(product_id = %id, "No similar ids, product not found upstream");
                Ok(Vec::new())
            }
            Err(error) if error.is_recoverable() => {
                warn!(product_id = %id, error = %error, "Similar ids unavailable, returning none");
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    /// Detail for `id` with the failure visible to the caller
    pub async fn try_fetch_detail(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>> {
        let catalog = Arc::clone(&self.catalog);
        self.circuit_breaker
            .call(|| async move { catalog.fetch_detail(id).await })
            .await
            .map_err(Self::flatten)
    }

    /// Detail for `id`, `None` on any failure
    pub async fn fetch_detail(&self, id: &ProductId) -> Option<ProductDetail> {
        match self.try_fetch_detail(id).await {
            Ok(detail) => detail,
            Err(error) => {
                warn!(product_id = %id, error = %error, "Product detail unavailable");
                None
            }
        }
    }

    fn flatten(error: CircuitBreakerError<UpstreamError>) -> UpstreamError {
        match error {
            CircuitBreakerError::CircuitOpen { component } => {
                UpstreamError::CircuitOpen { component }
            }
            CircuitBreakerError::OperationFailed(e) => e,
        }
    }
}
