//! # Upstream Error Types

use thiserror::Error;

/// Upstream operation result type
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failures talking to the upstream product catalog
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Transport error calling {url}: {message}")]
    Transport {
        url: String,
        message: String,
        timeout: bool,
    },

    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed upstream response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("Upstream client configuration error: {0}")]
    Configuration(String),

    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },
}

impl UpstreamError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            timeout: false,
        }
    }

    pub fn timeout(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            timeout: true,
        }
    }

    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether the failure reflects the upstream being unavailable
    ///
    /// Unavailability degrades to "no result"; anything else means the
    /// upstream answered in a way this service cannot use.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            UpstreamError::Transport { .. } => true,
            UpstreamError::CircuitOpen { .. } => true,
            UpstreamError::Status { status, .. } => *status >= 500 || *status == 429,
            UpstreamError::Decode { .. } => false,
            UpstreamError::InvalidUrl(_) => false,
            UpstreamError::Configuration(_) => false,
        }
    }
}
