#![allow(clippy::doc_markdown)] // Allow technical terms like YAML, JSON in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Similar Products
//!
//! Aggregation service answering "which products are similar to this one,
//! and what are their current details?" on top of an upstream catalog.
//!
//! ## Overview
//!
//! One request turns into one upstream list call followed by one detail
//! lookup per similar id. The detail lookups are shielded by a shared cache
//! and a shared circuit breaker, run with bounded concurrency, and tolerate
//! partial failure: a bad related product is dropped instead of failing the
//! whole response.
//!
//! ## Module Organization
//!
//! - [`models`] - Product ids and product details
//! - [`cache`] - Bounded, expiring, single-flight detail store
//! - [`resilience`] - Sliding-window circuit breaker
//! - [`upstream`] - Catalog transport seam, HTTP implementation, protected client
//! - [`services`] - The aggregation engine
//! - [`web`] - `axum` routes over the engine
//! - [`config`] - Layered YAML + environment configuration
//! - [`bootstrap`] - Component wiring for one process
//! - [`logging`] - `tracing` subscriber setup
//! - [`error`] - Service-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use similar_products::bootstrap::SimilarProductsSystem;
//! use similar_products::config::ConfigManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let system = SimilarProductsSystem::from_config(manager.config())?;
//!
//! let details = system.service.get_similar_products("1").await?;
//! for detail in &details {
//!     println!("{} costs {}", detail.id(), detail.price());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and doc tests
//! ```

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod services;
pub mod upstream;
pub mod web;

pub use bootstrap::{BootstrapError, SimilarProductsSystem};
pub use cache::{DetailStore, DetailStoreConfig};
pub use config::{AppConfig, ConfigManager, ConfigurationError};
pub use error::{Result, SimilarProductsError};
pub use models::{ProductDetail, ProductId, SimilarIdList};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use services::{SimilarProductsService, SimilarProductsServiceConfig};
pub use upstream::{HttpProductCatalog, ProductCatalog, UpstreamClient, UpstreamError};
