//! Transport seam for the upstream product catalog.

use crate::models::{ProductDetail, ProductId, SimilarIdList};
use crate::upstream::errors::UpstreamResult;
use async_trait::async_trait;

/// Raw access to the two upstream catalog operations
///
/// Implementations perform a single attempt with no retries and no circuit
/// breaking; `UpstreamClient` layers those policies on top. `Ok(None)` means
/// the upstream answered "not found".
#[async_trait]
pub trait ProductCatalog: Send + Sync + std::fmt::Debug {
    /// `GET /product/{id}/similarids`
    async fn fetch_similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<SimilarIdList>>;

    /// `GET /product/{id}`
    async fn fetch_detail(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>>;
}
