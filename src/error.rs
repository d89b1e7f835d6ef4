//! Top-level error type returned by the similar-products service.

use crate::models::ProductId;
use crate::upstream::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimilarProductsError {
    /// The similar-ids lookup failed in a way that cannot degrade to "none"
    #[error("Failed to retrieve similar products for: {product_id}")]
    Retrieval {
        product_id: ProductId,
        #[source]
        source: UpstreamError,
    },
}

impl SimilarProductsError {
    pub fn product_id(&self) -> &ProductId {
        match self {
            SimilarProductsError::Retrieval { product_id, .. } => product_id,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimilarProductsError>;
