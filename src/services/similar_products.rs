//! # Similar Products Service
//!
//! Aggregates "similar ids → detail per id" for one source product.
//!
//! ## Behavior
//!
//! - **Bounded fan-out**: detail lookups run as spawned tasks gated by a
//!   per-request semaphore of `concurrency_level` permits
//! - **Through the store**: every lookup goes through the shared
//!   [`DetailStore`], so duplicate and concurrent ids share one load
//! - **Partial failure**: a missing or failed detail is dropped, never fatal
//! - **Deadline**: with `similar_products_timeout` set, lookups still running
//!   at the deadline are aborted and dropped; shared store loads keep going
//! - **Cancellation**: dropping the request future aborts its queued and
//!   running lookups
//! - **Ordering**: results follow the upstream id order, duplicates included

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument, warn, Instrument};

use crate::cache::DetailStore;
use crate::error::{Result, SimilarProductsError};
use crate::models::{ProductDetail, ProductId};
use crate::upstream::UpstreamClient;

/// Tuning for the aggregation fan-out
#[derive(Debug, Clone)]
pub struct SimilarProductsServiceConfig {
    /// Deadline for the detail fan-out of one request; `None` waits for all
    pub similar_products_timeout: Option<Duration>,
    /// Maximum detail lookups in flight for one request
    pub concurrency_level: usize,
}

impl Default for SimilarProductsServiceConfig {
    fn default() -> Self {
        Self {
            similar_products_timeout: Some(Duration::from_secs(5)),
            concurrency_level: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimilarProductsService {
    client: Arc<UpstreamClient>,
    store: DetailStore,
    config: SimilarProductsServiceConfig,
}

impl SimilarProductsService {
    pub fn new(
        client: Arc<UpstreamClient>,
        store: DetailStore,
        config: SimilarProductsServiceConfig,
    ) -> Self {
        if config.concurrency_level == 0 {
            warn!("concurrency_level of 0 is treated as 1");
        }
        Self {
            client,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SimilarProductsServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &DetailStore {
        &self.store
    }

    pub fn client(&self) -> &Arc<UpstreamClient> {
        &self.client
    }

    /// Details of the products similar to `product_id`, in upstream order
    ///
    /// Only an unrecoverable failure of the similar-ids lookup is returned as
    /// an error. Details that cannot be resolved are left out.
    #[instrument(skip(self), fields(similar_count))]
    pub async fn get_similar_products(&self, product_id: &str) -> Result<Vec<ProductDetail>> {
        let product_id = ProductId::new(product_id);

        let ids = self
            .client
            .list_similar_ids(&product_id)
            .await
            .map_err(|source| SimilarProductsError::Retrieval {
                product_id: product_id.clone(),
                source,
            })?;

        tracing::Span::current().record("similar_count", ids.len());
        if ids.is_empty() {
            debug!("No similar ids to resolve");
            return Ok(Vec::new());
        }

        let deadline = self
            .config
            .similar_products_timeout
            .map(|timeout| Instant::now() + timeout);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_level.max(1)));

        let requested = ids.len();

        // Dropping the set aborts every lookup of this request that is still queued or running
        let mut lookups = JoinSet::new();
        for (index, id) in ids.into_iter().enumerate() {
            let lookup = resolve_detail(
                Arc::clone(&self.client),
                self.store.clone(),
                Arc::clone(&semaphore),
                id,
            );
            lookups.spawn(async move { (index, lookup.await) }.in_current_span());
        }

        // Slots are indexed by input position so the output keeps upstream order
        let mut slots: Vec<Option<ProductDetail>> = vec![None; requested];

        loop {
            let next = match deadline {
                Some(deadline) => match timeout_at(deadline, lookups.join_next()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => lookups.join_next().await,
            };
            match next {
                Some(joined) => collect_lookup(&mut slots, joined),
                None => break,
            }
        }

        // A lookup that already finished is collected even past the deadline
        while let Some(joined) = lookups.try_join_next() {
            collect_lookup(&mut slots, joined);
        }

        let timed_out = lookups.len();
        lookups.abort_all();

        let details: Vec<ProductDetail> = slots.into_iter().flatten().collect();

        if timed_out > 0 {
            warn!(
                timed_out,
                requested, "Deadline reached, dropping unfinished detail lookups"
            );
        }

        info!(
            requested,
            resolved = details.len(),
            "Resolved similar products"
        );

        Ok(details)
    }
}

fn collect_lookup(
    slots: &mut [Option<ProductDetail>],
    joined: std::result::Result<(usize, Option<ProductDetail>), JoinError>,
) {
    match joined {
        Ok((index, detail)) => slots[index] = detail,
        Err(join_error) => warn!(error = %join_error, "Detail lookup task failed"),
    }
}

async fn resolve_detail(
    client: Arc<UpstreamClient>,
    store: DetailStore,
    semaphore: Arc<Semaphore>,
    id: ProductId,
) -> Option<ProductDetail> {
    // The semaphore is owned by this request and never closed
    let _permit = semaphore.acquire_owned().await.ok()?;

    let result = store
        .get(&id, move |id| async move { client.try_fetch_detail(&id).await })
        .await;

    match result {
        Ok(Some(detail)) => Some(detail),
        Ok(None) => {
            debug!(similar_id = %id, "Similar product not found, skipping");
            None
        }
        Err(error) => {
            warn!(similar_id = %id, error = %error, "Similar product detail unavailable, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimilarProductsServiceConfig::default();
        assert_eq!(config.similar_products_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.concurrency_level, 10);
    }
}
