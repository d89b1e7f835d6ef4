//! # Structured Logging Module
//!
//! Console logging through the `tracing` ecosystem, configured once per
//! process. Production output is JSON; other environments get the
//! human-readable formatter with ANSI colors when stdout is a terminal.
//!
//! Level resolution: `LOG_LEVEL`, then `RUST_LOG`, then an environment
//! default (`info` in production, `debug` elsewhere).

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigManager;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber,
/// and an already-installed global subscriber is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let log_level = get_log_level(&environment);
        let json_output = environment == "production";
        let use_ansi = !json_output && std::io::stdout().is_terminal();

        let console_layer = if json_output {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&log_level))
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(console_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                log_level = %log_level,
                json_output,
                "Structured logging initialized"
            );
        }
    });
}

/// Get log level based on environment variables or environment defaults
fn get_log_level(environment: &str) -> String {
    let explicit = std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    resolve_log_level(environment, explicit)
}

fn resolve_log_level(environment: &str, explicit: Option<String>) -> String {
    if let Some(level) = explicit.filter(|level| !level.trim().is_empty()) {
        return level.to_lowercase();
    }

    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
