use hyper::StatusCode;
use thiserror::Error;

/// Rejections raised while building a [`crate::RunSpec`], before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid request method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid concurrency argument: {0}")]
    InvalidConcurrency(usize),

    #[error("invalid header {line:?}: {reason}")]
    InvalidHeader { line: String, reason: String },
}

/// Why a single attempt counts as a failure. Never fatal to a worker.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("non-200 return code: {}, response: {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("{request}: stopped after {limit} redirects")]
    TooManyRedirects { request: String, limit: usize },

    #[error("invalid redirect location {location:?}: {reason}")]
    Redirect { location: String, reason: String },
}

impl AttemptError {
    /// True when no final response status was received.
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Status { .. })
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("{failed} of {concurrency} workers did not finish: {first}")]
    WorkerLost {
        failed: usize,
        concurrency: usize,
        first: String,
    },
}
