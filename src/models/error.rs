//! Error types for demogen.
//!
//! Taxonomy:
//! - Expected failures: bad input, missing config
//! - Infrastructure failures: network, timeout, rate limits
//! - Invariant violations: bugs, should not happen

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for demogen.
#[derive(Debug, Error)]
pub enum DemogenError {
    // ═══════════════════════════════════════════════════════════════════
    // EXPECTED FAILURES
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    // ═══════════════════════════════════════════════════════════════════
    // INFRASTRUCTURE FAILURES
    // ═══════════════════════════════════════════════════════════════════
    #[error("Census API error: {0}")]
    Census(#[from] CensusError),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════
    // INVARIANT VIOLATIONS
    // ═══════════════════════════════════════════════════════════════════
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DemogenError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Census API specific errors.
///
/// A typed classification of per-request failures: the pipeline recovers
/// from all of these locally (the tract is marked failed, the loop goes
/// on), and the rate-limit variant additionally triggers a backoff.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Rate limited by Census API{}", .retry_after_secs.map(|s| format!(": retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<f64> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No data returned for the requested tract")]
    NoData,

    #[error("Invalid response: {0}")]
    Parse(String),
}

impl CensusError {
    /// Whether this failure is a rate-limit signal that should back off
    /// the pacing controller.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Retry delay hint in seconds, if the server provided one.
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Self::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Result type alias for demogen.
pub type Result<T> = std::result::Result<T, DemogenError>;
