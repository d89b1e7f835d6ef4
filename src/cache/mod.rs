//! # Detail Cache Module
//!
//! In-process, cache-aside storage for resolved product details.
//!
//! ## Design Decisions
//!
//! - **Single-flight loading**: concurrent misses for one key share one load
//! - **Failures are never memoized**: errors and not-found results leave the
//!   key empty so the next lookup retries
//! - **Loads outlive callers**: a load runs on its own task, so a caller that
//!   gives up (deadline, disconnect) never cancels it for the others
//! - **Bounded and expiring**: LRU size bound plus write and idle TTLs
//!
//! The store is not distributed. Each process keeps its own entries.

pub mod detail_store;
pub mod errors;

pub use detail_store::{DetailStore, DetailStoreConfig, DetailStoreStats};
pub use errors::{CacheLoadError, CacheResult};
