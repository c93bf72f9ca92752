//! Error types for the upstream and source layers.
//!
//! The application layer wraps these in `anyhow` with context; sources
//! return them directly so callers can tell a transport failure from a
//! malformed payload.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
