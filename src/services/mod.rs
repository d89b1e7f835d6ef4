//! # Services
//!
//! Request-level orchestration over the upstream client and detail store.

pub mod similar_products;

pub use similar_products::{SimilarProductsService, SimilarProductsServiceConfig};
