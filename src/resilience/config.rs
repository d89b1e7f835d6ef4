//! # Circuit Breaker Configuration
//!
//! Runtime parameters for a single sliding-window circuit breaker. The
//! YAML-facing section lives in `crate::config::CircuitBreakerSection` and
//! converts into this struct via `to_resilience_config()`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure rate (percent, 1..=100) at or above which the circuit opens
    pub failure_rate_threshold: f64,

    /// Slow-call rate (percent, 1..=100) at or above which the circuit opens
    pub slow_call_rate_threshold: f64,

    /// Calls taking at least this long count as slow
    pub slow_call_duration_threshold: Duration,

    /// Number of most recent outcomes kept in the closed-state window
    pub sliding_window_size: u32,

    /// Outcomes required before rates are evaluated
    pub minimum_number_of_calls: u32,

    /// Time to wait in open state before admitting trial calls
    pub wait_duration_in_open_state: Duration,

    /// Trial calls admitted while half-open
    pub permitted_calls_in_half_open_state: u32,
}

impl CircuitBreakerConfig {
    /// Configuration for the upstream product catalog
    pub fn for_product_catalog() -> Self {
        Self::default()
    }

    /// Small windows and short waits for tests
    pub fn for_test() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            slow_call_rate_threshold: 100.0,
            slow_call_duration_threshold: Duration::from_secs(1),
            sliding_window_size: 4,
            minimum_number_of_calls: 4,
            wait_duration_in_open_state: Duration::from_millis(50),
            permitted_calls_in_half_open_state: 1,
        }
    }

    /// Outcomes needed before the closed-state window is evaluated
    pub fn effective_minimum_calls(&self) -> u32 {
        self.minimum_number_of_calls.min(self.sliding_window_size)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err("failure_rate_threshold must be within (0, 100]".to_string());
        }

        if !(self.slow_call_rate_threshold > 0.0 && self.slow_call_rate_threshold <= 100.0) {
            return Err("slow_call_rate_threshold must be within (0, 100]".to_string());
        }

        if self.slow_call_duration_threshold.is_zero() {
            return Err("slow_call_duration_threshold must be greater than 0".to_string());
        }

        if self.sliding_window_size == 0 {
            return Err("sliding_window_size must be greater than 0".to_string());
        }

        if self.minimum_number_of_calls == 0 {
            return Err("minimum_number_of_calls must be greater than 0".to_string());
        }

        if self.wait_duration_in_open_state.is_zero() {
            return Err("wait_duration_in_open_state must be greater than 0".to_string());
        }

        if self.permitted_calls_in_half_open_state == 0 {
            return Err("permitted_calls_in_half_open_state must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            slow_call_rate_threshold: 50.0,
            slow_call_duration_threshold: Duration::from_secs(5),
            sliding_window_size: 100,
            minimum_number_of_calls: 20,
            wait_duration_in_open_state: Duration::from_secs(10),
            permitted_calls_in_half_open_state: 10,
        }
    }
}
