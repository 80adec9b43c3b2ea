//! Error types for the extraction engine.
//!
//! Only failures that matter beyond a single field or strategy get a variant
//! here. A field or item that fails to match is an `Option::None`, and a
//! strategy that finds nothing returns an empty catalog; neither is an error.

use thiserror::Error;

/// Failures surfaced by a page extraction or by the output layer.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page never reached a recognizable content state in time.
    #[error("timed out after {seconds}s waiting for {url}")]
    AcquisitionTimeout { url: String, seconds: u64 },

    /// The browser session itself failed (launch, transport, navigation).
    #[error("browser session failure: {0}")]
    Session(String),

    /// A script ran but raised or returned something unusable.
    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl ScrapeError {
    /// Whether a strategy may treat this error as "found nothing" and let the
    /// next strategy run. Everything else means the session is unusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScrapeError::Script(_) | ScrapeError::Json(_))
    }
}
