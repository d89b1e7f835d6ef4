//! Shared test helpers: an in-memory `ProductCatalog` with scripted
//! responses, delays and call accounting.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use similar_products::config::AppConfig;
use similar_products::upstream::{ProductCatalog, UpstreamError, UpstreamResult};
use similar_products::{ProductDetail, ProductId, SimilarIdList, SimilarProductsSystem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Failure kinds a scripted response can produce
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transport,
    Timeout,
    Status(u16),
    Malformed,
}

impl Failure {
    fn into_error(self, path: &str) -> UpstreamError {
        match self {
            Failure::Transport => UpstreamError::transport(path, "connection refused"),
            Failure::Timeout => UpstreamError::timeout(path, "operation timed out"),
            Failure::Status(status) => UpstreamError::status(status, path),
            Failure::Malformed => UpstreamError::decode(path, "expected value at line 1"),
        }
    }
}

#[derive(Debug, Clone)]
enum Scripted<T> {
    Found(T),
    NotFound,
    Fail(Failure),
}

#[derive(Debug, Clone)]
struct DetailScript {
    response: Scripted<ProductDetail>,
    delay: Duration,
}

/// In-memory catalog; unknown ids answer "not found"
#[derive(Debug, Default)]
pub struct StubCatalog {
    similar: Mutex<HashMap<String, Scripted<SimilarIdList>>>,
    details: Mutex<HashMap<String, DetailScript>>,
    similar_calls: AtomicUsize,
    detail_calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a StubCatalog);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_similar(self, id: &str, similar: &[&str]) -> Self {
        let ids = similar.iter().map(|s| ProductId::new(*s)).collect();
        self.similar.lock().insert(id.to_string(), Scripted::Found(ids));
        self
    }

    pub fn with_similar_failure(self, id: &str, failure: Failure) -> Self {
        self.similar
            .lock()
            .insert(id.to_string(), Scripted::Fail(failure));
        self
    }

    pub fn with_detail(self, id: &str, name: &str, price: f64, available: bool) -> Self {
        self.with_slow_detail(id, Duration::ZERO, name, price, available)
    }

    pub fn with_slow_detail(
        self,
        id: &str,
        delay: Duration,
        name: &str,
        price: f64,
        available: bool,
    ) -> Self {
        let detail = ProductDetail::new(id, Some(name.to_string()), price, available);
        self.details.lock().insert(
            id.to_string(),
            DetailScript {
                response: Scripted::Found(detail),
                delay,
            },
        );
        self
    }

    pub fn with_detail_not_found(self, id: &str) -> Self {
        self.details.lock().insert(
            id.to_string(),
            DetailScript {
                response: Scripted::NotFound,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_detail_failure(self, id: &str, failure: Failure) -> Self {
        self.details.lock().insert(
            id.to_string(),
            DetailScript {
                response: Scripted::Fail(failure),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn similar_calls(&self) -> usize {
        self.similar_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self, id: &str) -> usize {
        self.detail_calls.lock().get(id).copied().unwrap_or(0)
    }

    pub fn total_detail_calls(&self) -> usize {
        self.detail_calls.lock().values().sum()
    }

    /// Highest number of detail calls observed running at once
    pub fn max_concurrent_detail_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn fetch_similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<SimilarIdList>> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.similar.lock().get(id.as_str()).cloned();
        match script {
            Some(Scripted::Found(ids)) => Ok(Some(ids)),
            Some(Scripted::Fail(failure)) => {
                Err(failure.into_error(&format!("/product/{id}/similarids")))
            }
            Some(Scripted::NotFound) | None => Ok(None),
        }
    }

    async fn fetch_detail(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>> {
        *self
            .detail_calls
            .lock()
            .entry(id.as_str().to_string())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(self);

        let script = self.details.lock().get(id.as_str()).cloned();
        let Some(script) = script else {
            return Ok(None);
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.response {
            Scripted::Found(detail) => Ok(Some(detail)),
            Scripted::NotFound => Ok(None),
            Scripted::Fail(failure) => Err(failure.into_error(&format!("/product/{id}"))),
        }
    }
}

/// Defaults with a breaker that will not trip during ordinary tests
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.service.similar_products_timeout_ms = Some(2_000);
    config
}

pub fn system_with(catalog: Arc<StubCatalog>, config: &AppConfig) -> SimilarProductsSystem {
    SimilarProductsSystem::with_catalog(config, catalog)
}

pub fn detail(id: &str, name: &str, price: f64, available: bool) -> ProductDetail {
    ProductDetail::new(id, Some(name.to_string()), price, available)
}
