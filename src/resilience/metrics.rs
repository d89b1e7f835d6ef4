//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshot of a circuit breaker, used by the health endpoint
//! and by logging.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Breaker name
    pub name: String,

    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Calls attempted since creation
    pub total_calls: u64,

    /// Successful calls since creation
    pub success_count: u64,

    /// Failed calls since creation
    pub failure_count: u64,

    /// Calls at or above the slow-call threshold since creation
    pub slow_call_count: u64,

    /// Calls rejected without being attempted
    pub not_permitted_count: u64,

    /// Outcomes currently held in the sliding window
    pub window_calls: u32,

    /// Failure rate of the current window (0.0 to 100.0), `None` until evaluable
    pub failure_rate: Option<f64>,

    /// Slow-call rate of the current window (0.0 to 100.0), `None` until evaluable
    pub slow_call_rate: Option<f64>,

    /// Average duration of attempted calls
    pub average_duration: Duration,
}

impl CircuitBreakerMetrics {
    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing system health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Failures: {} | Slow: {} | Rejected: {} | Window failure rate: {} | Avg Duration: {}ms",
            self.state_description(),
            self.total_calls,
            self.failure_count,
            self.slow_call_count,
            self.not_permitted_count,
            self.failure_rate
                .map(|rate| format!("{rate:.1}%"))
                .unwrap_or_else(|| "n/a".to_string()),
            self.average_duration.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: CircuitState) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            name: "catalog".to_string(),
            current_state: state,
            total_calls: 10,
            success_count: 7,
            failure_count: 3,
            slow_call_count: 1,
            not_permitted_count: 0,
            window_calls: 10,
            failure_rate: Some(30.0),
            slow_call_rate: Some(10.0),
            average_duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_metrics_health_calculation() {
        assert!(snapshot(CircuitState::Closed).is_healthy());
        assert!(snapshot(CircuitState::HalfOpen).is_healthy());
        assert!(!snapshot(CircuitState::Open).is_healthy());
    }

    #[test]
    fn test_format_summary() {
        let summary = snapshot(CircuitState::Closed).format_summary();
        assert!(summary.contains("Healthy"));
        assert!(summary.contains("Window failure rate: 30.0%"));
    }
}
