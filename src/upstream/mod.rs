//! # Upstream Catalog Module
//!
//! Everything that talks to the upstream product catalog:
//!
//! - [`ProductCatalog`]: the transport seam (one attempt per call)
//! - [`HttpProductCatalog`]: `reqwest` implementation of the seam
//! - [`UpstreamClient`]: circuit-breaker protection and degradation policy

pub mod catalog;
pub mod client;
pub mod errors;
pub mod http_catalog;

pub use catalog::ProductCatalog;
pub use client::UpstreamClient;
pub use errors::{UpstreamError, UpstreamResult};
pub use http_catalog::{HttpCatalogConfig, HttpProductCatalog};
