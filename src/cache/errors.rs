//! Cache error types

use crate::models::ProductId;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a detail store lookup
///
/// Cloneable so a single load outcome can be handed to every caller that
/// waited on it.
#[derive(Debug, Clone, Error)]
pub enum CacheLoadError {
    /// The loader returned an error; nothing was cached
    #[error("Loader failed for {key}: {cause}")]
    LoaderFailed {
        key: ProductId,
        cause: Arc<dyn StdError + Send + Sync>,
    },

    /// The load task ended without producing a value (panic or runtime shutdown)
    #[error("Load for {key} aborted: {reason}")]
    Aborted { key: ProductId, reason: String },
}

impl CacheLoadError {
    pub fn loader_failed<E>(key: &ProductId, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::LoaderFailed {
            key: key.clone(),
            cause: Arc::new(cause),
        }
    }

    pub fn key(&self) -> &ProductId {
        match self {
            Self::LoaderFailed { key, .. } | Self::Aborted { key, .. } => key,
        }
    }
}

/// Result type for detail store lookups
pub type CacheResult<T> = Result<T, CacheLoadError>;
