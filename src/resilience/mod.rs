//! # Resilience Module
//!
//! Fault isolation for the upstream product catalog. One named
//! [`CircuitBreaker`] exists per upstream dependency and is shared by every
//! request; it fails fast while the dependency is unhealthy instead of
//! letting each request wait out its own timeout.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use similar_products::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let circuit_breaker =
//!     CircuitBreaker::new("productDetailCB".to_string(), CircuitBreakerConfig::default());
//!
//! let _result = circuit_breaker
//!     .call(|| async { Ok::<&str, std::io::Error>("success") })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
