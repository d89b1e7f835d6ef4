//! # Circuit Breaker Implementation
//!
//! Guards calls to a single upstream dependency. Three states:
//! Closed (normal operation), Open (failing fast) and Half-Open (trial calls).
//!
//! Outcomes are kept in a count-based sliding window. The circuit opens once
//! the window holds enough outcomes and either the failure rate or the
//! slow-call rate reaches its threshold. After the open wait elapses the next
//! call moves the breaker to half-open, where a fixed number of trial calls
//! decides between closing and re-opening.

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the call was not attempted
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CallOutcome {
    failed: bool,
    slow: bool,
}

/// Fixed-capacity record of the most recent call outcomes
#[derive(Debug)]
struct SlidingWindow {
    capacity: usize,
    outcomes: VecDeque<CallOutcome>,
    failures: u32,
    slow_calls: u32,
}

impl SlidingWindow {
    fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1) as usize;
        Self {
            capacity,
            outcomes: VecDeque::with_capacity(capacity),
            failures: 0,
            slow_calls: 0,
        }
    }

    fn record(&mut self, outcome: CallOutcome) {
        if self.outcomes.len() == self.capacity {
            if let Some(evicted) = self.outcomes.pop_front() {
                self.failures -= u32::from(evicted.failed);
                self.slow_calls -= u32::from(evicted.slow);
            }
        }
        self.failures += u32::from(outcome.failed);
        self.slow_calls += u32::from(outcome.slow);
        self.outcomes.push_back(outcome);
    }

    fn len(&self) -> u32 {
        self.outcomes.len() as u32
    }

    /// Failure and slow-call rates in percent, once `minimum` outcomes exist
    fn rates(&self, minimum: u32) -> Option<(f64, f64)> {
        let calls = self.len();
        if calls == 0 || calls < minimum {
            return None;
        }
        let calls = f64::from(calls);
        Some((
            f64::from(self.failures) * 100.0 / calls,
            f64::from(self.slow_calls) * 100.0 / calls,
        ))
    }
}

/// Mutable breaker state guarded by a single lock
#[derive(Debug)]
struct BreakerCore {
    window: SlidingWindow,
    opened_at: Option<Instant>,
    half_open_admitted: u32,
    /// Bumped on every transition; outcomes from an older epoch are ignored
    epoch: u64,
}

/// Cumulative counters, never reset
#[derive(Debug, Default)]
struct BreakerCounters {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    slow_call_count: AtomicU64,
    not_permitted_count: AtomicU64,
    total_duration_nanos: AtomicU64,
}

/// Sliding-window circuit breaker shared by every caller of one dependency
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state, readable without taking the lock
    state: AtomicU8,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    core: Mutex<BreakerCore>,

    counters: BreakerCounters,
}

/// Permission to run one call; releases an unused half-open slot on drop
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    epoch: u64,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(mut self, failed: bool, duration: Duration) {
        self.completed = true;
        self.breaker.on_result(self.epoch, failed, duration);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.breaker.release_unused_permit(self.epoch);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_rate_threshold = config.failure_rate_threshold,
            slow_call_rate_threshold = config.slow_call_rate_threshold,
            slow_call_duration_ms = config.slow_call_duration_threshold.as_millis(),
            sliding_window_size = config.sliding_window_size,
            minimum_number_of_calls = config.minimum_number_of_calls,
            wait_duration_ms = config.wait_duration_in_open_state.as_millis(),
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            core: Mutex::new(BreakerCore {
                window: SlidingWindow::new(config.sliding_window_size),
                opened_at: None,
                half_open_admitted: 0,
                epoch: 0,
            }),
            config,
            counters: BreakerCounters::default(),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// When the circuit is open the operation is never invoked.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire_permission() else {
            self.counters
                .not_permitted_count
                .fetch_add(1, Ordering::Relaxed);
            debug!(component = %self.name, "Call rejected, circuit open");
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        };

        let start_time = Instant::now();
        let result = operation().await;
        permit.complete(result.is_err(), start_time.elapsed());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    fn try_acquire_permission(&self) -> Option<CallPermit<'_>> {
        let mut core = self.core.lock();
        let admitted = match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let wait_elapsed = core
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.config.wait_duration_in_open_state)
                    .unwrap_or(true);
                if wait_elapsed {
                    self.transition_to_half_open(&mut core);
                    core.half_open_admitted = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if core.half_open_admitted < self.config.permitted_calls_in_half_open_state {
                    core.half_open_admitted += 1;
                    true
                } else {
                    false
                }
            }
        };

        admitted.then(|| CallPermit {
            breaker: self,
            epoch: core.epoch,
            completed: false,
        })
    }

    fn release_unused_permit(&self, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch == epoch && self.state() == CircuitState::HalfOpen {
            core.half_open_admitted = core.half_open_admitted.saturating_sub(1);
        }
    }

    fn on_result(&self, epoch: u64, failed: bool, duration: Duration) {
        let slow = duration >= self.config.slow_call_duration_threshold;

        self.counters.total_calls.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if failed {
            self.counters.failure_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.success_count.fetch_add(1, Ordering::Relaxed);
        }
        if slow {
            self.counters.slow_call_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis(),
            failed = failed,
            slow = slow,
            "Call outcome recorded"
        );

        let mut core = self.core.lock();
        if core.epoch != epoch {
            debug!(component = %self.name, "Outcome from a previous breaker state ignored");
            return;
        }

        core.window.record(CallOutcome { failed, slow });

        match self.state() {
            CircuitState::Closed => {
                if let Some((failure_rate, slow_rate)) =
                    core.window.rates(self.config.effective_minimum_calls())
                {
                    if self.exceeds_thresholds(failure_rate, slow_rate) {
                        self.transition_to_open(&mut core, failure_rate, slow_rate);
                    }
                }
            }
            CircuitState::HalfOpen => {
                let permitted = self.config.permitted_calls_in_half_open_state;
                if let Some((failure_rate, slow_rate)) = core.window.rates(permitted) {
                    if self.exceeds_thresholds(failure_rate, slow_rate) {
                        self.transition_to_open(&mut core, failure_rate, slow_rate);
                    } else {
                        self.transition_to_closed(&mut core);
                    }
                }
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Outcome recorded while circuit is open");
            }
        }
    }

    fn exceeds_thresholds(&self, failure_rate: f64, slow_rate: f64) -> bool {
        failure_rate >= self.config.failure_rate_threshold
            || slow_rate >= self.config.slow_call_rate_threshold
    }

    /// Transition to closed state (normal operation)
    fn transition_to_closed(&self, core: &mut BreakerCore) {
        core.window = SlidingWindow::new(self.config.sliding_window_size);
        core.opened_at = None;
        core.half_open_admitted = 0;
        core.epoch += 1;
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        info!(
            component = %self.name,
            total_calls = self.counters.total_calls.load(Ordering::Relaxed),
            "Circuit breaker closed (recovered)"
        );
    }

    /// Transition to open state (failing fast)
    fn transition_to_open(&self, core: &mut BreakerCore, failure_rate: f64, slow_rate: f64) {
        core.opened_at = Some(Instant::now());
        core.half_open_admitted = 0;
        core.epoch += 1;
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        error!(
            component = %self.name,
            failure_rate = failure_rate,
            slow_call_rate = slow_rate,
            failure_rate_threshold = self.config.failure_rate_threshold,
            slow_call_rate_threshold = self.config.slow_call_rate_threshold,
            wait_duration_ms = self.config.wait_duration_in_open_state.as_millis(),
            "Circuit breaker opened (failing fast)"
        );
    }

    /// Transition to half-open state (testing recovery)
    fn transition_to_half_open(&self, core: &mut BreakerCore) {
        core.window = SlidingWindow::new(self.config.permitted_calls_in_half_open_state);
        core.half_open_admitted = 0;
        core.epoch += 1;
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);

        info!(
            component = %self.name,
            permitted_calls = self.config.permitted_calls_in_half_open_state,
            "Circuit breaker half-open (testing recovery)"
        );
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut core = self.core.lock();
        self.transition_to_open(&mut core, 100.0, 0.0);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut core = self.core.lock();
        self.transition_to_closed(&mut core);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let state = self.state();
        let (window_calls, rates) = {
            let core = self.core.lock();
            let minimum = match state {
                CircuitState::HalfOpen => self.config.permitted_calls_in_half_open_state,
                _ => self.config.effective_minimum_calls(),
            };
            (core.window.len(), core.window.rates(minimum))
        };

        let total_calls = self.counters.total_calls.load(Ordering::Relaxed);
        let total_duration_nanos = self.counters.total_duration_nanos.load(Ordering::Relaxed);
        let average_duration = if total_calls > 0 {
            Duration::from_nanos(total_duration_nanos / total_calls)
        } else {
            Duration::ZERO
        };

        CircuitBreakerMetrics {
            name: self.name.clone(),
            current_state: state,
            total_calls,
            success_count: self.counters.success_count.load(Ordering::Relaxed),
            failure_count: self.counters.failure_count.load(Ordering::Relaxed),
            slow_call_count: self.counters.slow_call_count.load(Ordering::Relaxed),
            not_permitted_count: self.counters.not_permitted_count.load(Ordering::Relaxed),
            window_calls,
            failure_rate: rates.map(|(failure_rate, _)| failure_rate),
            slow_call_rate: rates.map(|(_, slow_rate)| slow_rate),
            average_duration,
        }
    }

    /// A breaker is healthy unless it is rejecting calls
    pub fn is_healthy(&self) -> bool {
        self.state() != CircuitState::Open
    }
}
