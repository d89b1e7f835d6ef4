//! # Health Check Handlers
//!
//! Liveness plus a view of the upstream circuit breaker and detail store.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::cache::DetailStoreStats;
use crate::resilience::{CircuitBreakerMetrics, CircuitState};
use crate::web::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    environment: String,
    circuit_breaker: CircuitBreakerHealth,
    detail_store: DetailStoreHealth,
}

#[derive(Debug, Serialize)]
pub struct CircuitBreakerHealth {
    name: String,
    state: CircuitState,
    description: String,
    failure_rate: Option<f64>,
    slow_call_rate: Option<f64>,
    window_calls: u32,
    total_calls: u64,
    not_permitted_calls: u64,
}

impl From<CircuitBreakerMetrics> for CircuitBreakerHealth {
    fn from(metrics: CircuitBreakerMetrics) -> Self {
        Self {
            description: metrics.state_description().to_string(),
            state: metrics.current_state,
            name: metrics.name,
            failure_rate: metrics.failure_rate,
            slow_call_rate: metrics.slow_call_rate,
            window_calls: metrics.window_calls,
            total_calls: metrics.total_calls,
            not_permitted_calls: metrics.not_permitted_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailStoreHealth {
    entries: u64,
    hits: u64,
    misses: u64,
    hit_rate: f64,
    load_failures: u64,
}

impl From<DetailStoreStats> for DetailStoreHealth {
    fn from(stats: DetailStoreStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            entries: stats.entry_count,
            hits: stats.hits,
            misses: stats.misses,
            load_failures: stats.load_failures,
        }
    }
}

/// Health check endpoint: GET /health
///
/// Always `200` while the process serves requests. An open breaker is
/// reported as `degraded`: the service keeps answering with partial or
/// empty results.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let breaker = state.circuit_breaker.metrics();
    let status = if breaker.is_healthy() { "ok" } else { "degraded" };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.clone(),
        circuit_breaker: breaker.into(),
        detail_store: state.detail_store.stats().into(),
    };

    (StatusCode::OK, Json(response))
}
